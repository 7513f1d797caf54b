//! Prelude module for convenient imports.
//!
//! ```ignore
//! use restline::prelude::*;
//! ```

pub use restline_core::prelude::*;

pub use crate::{HyperTransport, RestClient};

pub use serde::{Deserialize, Serialize};
