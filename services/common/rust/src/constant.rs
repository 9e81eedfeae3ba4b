pub mod env_vars {
    pub const SYS_BASEPATH: &str = "SYS_BASE_PATH";
    pub const SERVICE_BASEPATH: &str = "SERVICE_BASE_PATH";
    // relative path starting from app / service home folder
    pub const CFG_FILEPATH: &str = "CONFIG_FILE_PATH";
    // optional, overrides the fault switch in the config file
    pub const RANDOM_ERRORS_ENABLED: &str = "RANDOM_ERRORS_ENABLED";
    pub const EXPECTED_LABELS: [&str; 4] = [
        SYS_BASEPATH,
        SERVICE_BASEPATH,
        CFG_FILEPATH,
        RANDOM_ERRORS_ENABLED,
    ];
}

pub mod feature_flag {
    pub const DEFAULT_HOST: &str = "localhost";
    pub const DEFAULT_PORT: u16 = 2772;
}

pub mod logging {
    use serde::Deserialize;

    #[derive(Deserialize)]
    pub enum Level {
        TRACE,
        DEBUG,
        INFO,
        WARNING,
        ERROR,
        FATAL,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Destination {
        CONSOLE,
        LOCALFS,
    }

    #[derive(Deserialize, Clone, Debug, Default, PartialEq)]
    #[serde(rename_all = "lowercase")]
    pub enum Format {
        #[default]
        PLAIN,
        JSON,
    }

    // attached to every event as field `service`
    pub const DEFAULT_SERVICE_NAME: &str = "shopping-orders";
}
