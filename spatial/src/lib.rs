//! Spatial queries over ended strokes for inkcast.
//!
//! - [`QuadTree`] indexes keyed bounding boxes over the logical canvas and
//!   answers region queries.
//! - [`EraserEngine`] decides whether an eraser stroke touches any active
//!   ink, so a collaborator's no-op eraser can be dropped instead of
//!   broadcast.
//! - [`render_order`] sorts strokes into drawing order.
//!
//! The index stores unpadded boxes. Brush radii are accounted for by
//! inflating the query region, which keeps inserts independent of the
//! largest brush in use.

mod config;
mod eraser;
mod quadtree;

pub use config::{HitTest, QuadTreeConfig};
pub use eraser::{render_order, EraserEngine};
pub use quadtree::QuadTree;
