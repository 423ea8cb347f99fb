//! Client options and connection strings.

use docstore_driver::Document;
use url::Url;

/// Client options the legacy API accepted that the driver no longer
/// understands. They are dropped before reaching the driver.
pub const DEPRECATED_CLIENT_OPTIONS: &[&str] = &["useUnifiedTopology", "useNewUrlParser"];

/// Remove deprecated options from a client options bag.
pub fn strip_deprecated(mut options: Document) -> Document {
    for key in DEPRECATED_CLIENT_OPTIONS {
        if options.remove(*key).is_some() {
            tracing::debug!(option = *key, "dropping deprecated client option");
        }
    }
    options
}

/// The database named by the connection string path, if any.
///
/// `docstore://localhost:27017/testdb` names `testdb`.
pub fn default_database(uri: &str) -> Option<String> {
    let url = Url::parse(uri).ok()?;
    url.path_segments()?
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
