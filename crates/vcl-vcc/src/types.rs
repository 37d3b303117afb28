//! The fixed type vocabulary of VCC signatures.

/// Types usable in function, method, and constructor signatures: the
/// scalar VCL types plus the module-only pseudo-types (private slots,
/// strands, the HTTP handles, and the generic enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VccType {
    String,
    StringList,
    Strands,
    Int,
    Real,
    Bool,
    Time,
    Duration,
    Bytes,
    Blob,
    Ip,
    Backend,
    Probe,
    Acl,
    Header,
    /// The generic HTTP handle; compatible with the four specific handles
    Http,
    HttpReq,
    HttpResp,
    HttpBereq,
    HttpBeresp,
    PrivTask,
    PrivVcl,
    PrivTop,
    PrivCall,
    Stevedore,
    Sub,
    Enum,
    Void,
}

/// Canonical spelling → type, for signature parsing.
static TYPE_NAMES: phf::Map<&'static str, VccType> = phf::phf_map! {
    "STRING" => VccType::String,
    "STRING_LIST" => VccType::StringList,
    "STRANDS" => VccType::Strands,
    "INT" => VccType::Int,
    "REAL" => VccType::Real,
    "BOOL" => VccType::Bool,
    "TIME" => VccType::Time,
    "DURATION" => VccType::Duration,
    "BYTES" => VccType::Bytes,
    "BLOB" => VccType::Blob,
    "IP" => VccType::Ip,
    "BACKEND" => VccType::Backend,
    "PROBE" => VccType::Probe,
    "ACL" => VccType::Acl,
    "HEADER" => VccType::Header,
    "HTTP" => VccType::Http,
    "HTTP_REQ" => VccType::HttpReq,
    "HTTP_RESP" => VccType::HttpResp,
    "HTTP_BEREQ" => VccType::HttpBereq,
    "HTTP_BERESP" => VccType::HttpBeresp,
    "PRIV_TASK" => VccType::PrivTask,
    "PRIV_VCL" => VccType::PrivVcl,
    "PRIV_TOP" => VccType::PrivTop,
    "PRIV_CALL" => VccType::PrivCall,
    "STEVEDORE" => VccType::Stevedore,
    "SUB" => VccType::Sub,
    "ENUM" => VccType::Enum,
    "VOID" => VccType::Void,
};

impl VccType {
    /// Parse a canonical type name.
    pub fn lookup(name: &str) -> Option<VccType> {
        TYPE_NAMES.get(name).copied()
    }

    /// The canonical spelling, as used in descriptors and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            VccType::String => "STRING",
            VccType::StringList => "STRING_LIST",
            VccType::Strands => "STRANDS",
            VccType::Int => "INT",
            VccType::Real => "REAL",
            VccType::Bool => "BOOL",
            VccType::Time => "TIME",
            VccType::Duration => "DURATION",
            VccType::Bytes => "BYTES",
            VccType::Blob => "BLOB",
            VccType::Ip => "IP",
            VccType::Backend => "BACKEND",
            VccType::Probe => "PROBE",
            VccType::Acl => "ACL",
            VccType::Header => "HEADER",
            VccType::Http => "HTTP",
            VccType::HttpReq => "HTTP_REQ",
            VccType::HttpResp => "HTTP_RESP",
            VccType::HttpBereq => "HTTP_BEREQ",
            VccType::HttpBeresp => "HTTP_BERESP",
            VccType::PrivTask => "PRIV_TASK",
            VccType::PrivVcl => "PRIV_VCL",
            VccType::PrivTop => "PRIV_TOP",
            VccType::PrivCall => "PRIV_CALL",
            VccType::Stevedore => "STEVEDORE",
            VccType::Sub => "SUB",
            VccType::Enum => "ENUM",
            VccType::Void => "VOID",
        }
    }

    /// Whether values of this type are implicit module state rather than
    /// caller-supplied arguments (the `PRIV_*` slots).
    pub fn is_private(&self) -> bool {
        matches!(
            self,
            VccType::PrivTask | VccType::PrivVcl | VccType::PrivTop | VccType::PrivCall
        )
    }
}

impl std::fmt::Display for VccType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
