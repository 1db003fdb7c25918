//! # photo-stamp CLI
//!
//! Command-line interface for the near-duplicate photo finder.
//!
//! ## Usage
//! ```bash
//! photo-stamp scan ~/Photos --policy nearest --keep larger
//! photo-stamp scan ~/Photos --output json
//! photo-stamp scan ~/Photos --delete --apply
//! ```

mod cli;

use photo_stamp::Result;

fn main() -> Result<()> {
    cli::run()
}
