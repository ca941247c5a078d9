//! User proofs: binding key ids to accounts on external services.
//!
//! A [`User`] claims "key `kex_...` is `alice` on `github`". The claim is
//! anchored as a `user` statement in the key's sigchain and proven by a signed,
//! armored copy of the claim posted on the service (a gist, a tweet, a reddit
//! post, a file on a web server).
//!
//! - [`services`]: per-service name rules, proof locations and fetching
//! - [`proof`]: finding and checking the armored statement inside fetched content
//! - [`Verifier`]: claim → [`UserResult`], with no side effects
//! - [`Users`]: the engine keeping results and the secondary indexes current
//!
//! Indexes live in the document store:
//!
//! | path                         | contents                          |
//! |------------------------------|-----------------------------------|
//! | `/kid/<kid>`                 | latest result for a key           |
//! | `/user/<name>@<service>`     | verified results by identity      |
//! | `/service/<service>@<name>`  | verified results by service       |
//! | `/search/<name>@<service>`   | searchable subset of `/user`      |

pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod proof;
pub mod result;
pub mod search;
pub mod services;
pub mod statement;
pub mod status;
pub mod user;
pub mod verifier;

pub use config::UsersConfig;
pub use engine::{SweepReport, Users};
pub use error::UsersError;
pub use index::IndexDocument;
pub use result::UserResult;
pub use search::{SearchRequest, SearchResult};
pub use services::{
    echo_url, Failure, NameError, Service, ServiceOptions, ServiceRegistry, UrlError,
};
pub use statement::{user_from_statement, user_statement, USER_STATEMENT_TYPE};
pub use status::Status;
pub use user::{sign_user, User};
pub use verifier::Verifier;
