//! Request-scoped domain models.
//!
//! Nothing here is persisted: a [`coach::CoachRequest`] is parsed once per
//! request, rendered into [`chat::ChatMessage`]s and discarded.

pub mod chat;
pub mod coach;
pub mod snapshot;
