// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod classify;
pub mod dates;
pub mod error;
pub mod format;
pub mod model;
pub mod pipeline;
pub mod refresh;
pub mod roles;
pub mod scroll;
pub mod snapshot;
pub mod state;

pub use classify::*;
pub use error::*;
pub use format::*;
pub use model::*;
pub use pipeline::*;
pub use refresh::*;
pub use roles::*;
pub use scroll::*;
pub use snapshot::*;
pub use state::*;
