// record constants
pub const DOC_ID: &str = "_id";
pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";
pub const FIELD_SEPARATOR: char = '.';

// populate constants
pub const POPULATE_PATH_SEPARATOR: char = '.';

// pipeline constants
pub const GROUP_KEY_SEPARATOR: &str = "_";
pub const GROUP_KEY_PAIR_SEPARATOR: &str = ":";
pub const GROUP_ALL_KEY: &str = "all";
pub const OPERATOR_PREFIX: char = '$';

// store constants
pub const JSON_FILE_EXTENSION: &str = "json";
pub const TEMP_FILE_SUFFIX: &str = "tmp";

pub const STOCKROOM_VERSION: &str = env!("CARGO_PKG_VERSION");
