//! Blocking, typed client for the Sensu Go REST API.
//!
//! # Overview
//! `Client` logs in against `/auth`, keeps the returned `Token`, and sends
//! resource calls (`Check`, `Handler`, `Filter`, `Namespace`, `User`) with a
//! bearer header. A token that is close to expiry is refreshed transparently
//! before the next call goes out.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`);
//!   the network round trip sits behind the `Transport` trait, with
//!   `UreqTransport` as the production implementation.
//! - The authentication state is derived from (endpoint, token); the
//!   admission filter turns it into a typed error before any I/O.
//! - Resource calls are described by `CallData` (method + path + fields)
//!   built from the `Resource` trait.
//! - All operations are synchronous and take `&mut self` when they may
//!   change session state.
//!
//! ```no_run
//! use sensu_client::{Client, Namespace, Resource, ServerEndpoint};
//!
//! # fn main() -> Result<(), sensu_client::ApiError> {
//! let mut client = Client::new(Some(ServerEndpoint::new("sensu.example.com")));
//! client.login("admin", "P@ssw0rd!")?;
//! for ns in Namespace::fetch(&mut client, None, None)? {
//!     println!("{}", ns.name);
//! }
//! # Ok(())
//! # }
//! ```

pub mod call;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod resources;
pub mod session;
pub mod token;

pub use call::CallData;
pub use client::{Admission, AuthState, Client};
pub use config::ClientConfig;
pub use endpoint::ServerEndpoint;
pub use error::{ApiError, ResourceError, SessionError, ValidationError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use resources::{
    AnyResource, Check, Filter, FilterAction, Handler, HandlerType, Namespace, ObjectMeta,
    Resource, ResourceKind, UrlPurpose, User,
};
pub use session::Session;
pub use token::Token;
