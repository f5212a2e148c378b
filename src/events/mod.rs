//! Message types exchanged across systems.
//!
//! Messages are double-buffered queues rotated once per tick by
//! [`update_message_queues`](crate::systems::queues::update_message_queues).
//!
//! Submodules:
//! - [`contact`] – bubble/bubble and bubble/wall contact reports from physics
//! - [`lifecycle`] – pop/merge requests in, lifecycle notifications out
//! - [`spawn`] – requests to add a bubble
pub mod contact;
pub mod lifecycle;
pub mod spawn;
