//! IGDB access: token exchange, query building, the metadata client and
//! response normalization.

pub mod auth;
pub mod client;
pub mod error;
pub mod image;
pub mod normalize;
pub mod query;
pub mod shape;

pub use auth::{AccessToken, Credentials, TokenProvider};
pub use client::{IgdbClient, RawRecord};
pub use error::{IgdbError, Problem, Violation, Violations};
pub use image::{image_url, ImageSize, ImageVariant};
pub use normalize::{extract_localized_name, validate, Localization, NormalizedGame};
pub use query::QueryDescription;
pub use shape::{Cardinality, FieldSpec, Kind, Schema, ValidatedRecord};

pub type Result<T> = std::result::Result<T, IgdbError>;
