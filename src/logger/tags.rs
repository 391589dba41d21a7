/// Log tags naming the subsystem a message comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTag {
    System,
    Config,
    Store,
    Reconcile,
    Summary,
    Telegram,
    Webserver,
    Media,
    Security,
    Other(String),
}

impl LogTag {
    /// Key used by `--debug-<key>` flags
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::Other(name) => name.to_lowercase(),
            other => other.to_plain_string().to_lowercase(),
        }
    }

    /// Uncolored display name used in log files
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Store => "STORE".to_string(),
            LogTag::Reconcile => "RECONCILE".to_string(),
            LogTag::Summary => "SUMMARY".to_string(),
            LogTag::Telegram => "TELEGRAM".to_string(),
            LogTag::Webserver => "WEBSERVER".to_string(),
            LogTag::Media => "MEDIA".to_string(),
            LogTag::Security => "SECURITY".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_keys() {
        assert_eq!(LogTag::Reconcile.to_debug_key(), "reconcile");
        assert_eq!(LogTag::Other("Upload".to_string()).to_debug_key(), "upload");
        assert_eq!(LogTag::Webserver.to_plain_string(), "WEBSERVER");
    }
}
