/*!
# Dungeon2d

Vertex batching and GPU buffer upload for 2D games.

Sprites, tiles and interface quads are accumulated on the CPU, then sent to the GPU in one
upload per frame and drawn in one call. The crate covers:

* [`VertexLayout`](resource::VertexLayout): the named, interleaved attributes of a vertex.
* [`DynamicVertexStore`](resource::DynamicVertexStore): a growable float array written vertex
  by vertex and uploaded to a device buffer.
* [`GpuBuffer`](resource::GpuBuffer): a device buffer with an explicit release, diagnosed when
  dropped without one.
* [`Batch`](resource::Batch): integer points, texture coordinates and packed colors kept in
  three separate buffers.
* [`IndexedMesh`](resource::IndexedMesh): shared vertices drawn through an element buffer.

Every device interaction goes through a [`Context`](context::Context) wrapping a
[`GraphicsDevice`](context::GraphicsDevice). [`WgpuDevice`](context::WgpuDevice) drives a
real GPU; [`RecordingDevice`](context::RecordingDevice) records commands without one.

```
use dungeon2d::prelude::*;

let mut ctxt = Context::new(RecordingDevice::new());
let mut store = DynamicVertexStore::new(&mut ctxt, VertexLayout::position_color_texture())?;

store.append_rectangle(Rect::new(0.0, 0.0, 16.0, 16.0), WHITE, Rect::UNIT);
assert_eq!(store.update(&mut ctxt)?, 6);

store.release(&mut ctxt);
# Ok::<(), dungeon2d::error::Error>(())
```
*/
#![allow(clippy::module_inception)]
#![allow(clippy::too_many_arguments)]

#[macro_use]
extern crate bitflags;
#[cfg(feature = "serde")]
extern crate serde;

pub use glamx;

pub mod color;
pub mod context;
pub mod error;
pub mod geometry;
pub mod renderer;
pub mod resource;

pub mod prelude {
    pub use crate::color::*;
    pub use crate::context::*;
    pub use crate::error::{Error, Result};
    pub use crate::geometry::*;
    pub use crate::renderer::*;
    pub use crate::resource::*;
    pub use glamx::{Mat3, Vec2, Vec3};
    pub use std::rc::Rc;
}
