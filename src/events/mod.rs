//! # Events Module
//!
//! Progress reporting for any front end.
//!
//! The core library emits events through a channel; the CLI (or any other
//! UI) listens on the receiving end and renders progress.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Fingerprint(FingerprintEvent::Progress(p)) = event {
//!             println!("Fingerprinted {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
