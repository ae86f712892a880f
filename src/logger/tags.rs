/// Log tags identify the subsystem a message comes from.
///
/// The debug key (`store`, `cache`, ...) is what `--debug <tag>` matches, and the
/// `log` target is `coinlist::<key>` so external subscribers can filter too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Store,
    Cache,
    Api,
    Engine,
    Refresh,
}

impl LogTag {
    pub const ALL: [LogTag; 7] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Store,
        LogTag::Cache,
        LogTag::Api,
        LogTag::Engine,
        LogTag::Refresh,
    ];

    pub fn to_debug_key(&self) -> String {
        self.key().to_string()
    }

    fn key(&self) -> &'static str {
        match self {
            LogTag::System => "system",
            LogTag::Config => "config",
            LogTag::Store => "store",
            LogTag::Cache => "cache",
            LogTag::Api => "api",
            LogTag::Engine => "engine",
            LogTag::Refresh => "refresh",
        }
    }

    pub fn to_plain_string(&self) -> String {
        self.key().to_uppercase()
    }

    pub fn target(&self) -> &'static str {
        match self {
            LogTag::System => "coinlist::system",
            LogTag::Config => "coinlist::config",
            LogTag::Store => "coinlist::store",
            LogTag::Cache => "coinlist::cache",
            LogTag::Api => "coinlist::api",
            LogTag::Engine => "coinlist::engine",
            LogTag::Refresh => "coinlist::refresh",
        }
    }

    pub fn from_debug_key(key: &str) -> Option<Self> {
        let key = key.trim().to_lowercase();
        Self::ALL.iter().copied().find(|tag| tag.key() == key)
    }

    pub fn from_target(target: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|tag| tag.target() == target)
    }
}
