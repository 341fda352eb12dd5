//! Interleaved vertex formats.

use crate::error::{Error, Result};

/// Size in bytes of one vertex component.
pub const COMPONENT_SIZE: usize = std::mem::size_of::<f32>();

/// A named shader input with its number of float components.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexAttribute {
    name: String,
    components: u32,
}

impl VertexAttribute {
    /// The shader input name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of consecutive floats written per vertex.
    #[inline]
    pub fn components(&self) -> u32 {
        self.components
    }
}

/// An ordered list of attributes describing one interleaved vertex.
///
/// Attribute order defines the byte offsets inside a vertex. The stride is cached and kept
/// in sync by [`add_attribute`](Self::add_attribute) and [`clear`](Self::clear).
/// Serialized as the attribute list alone; deserializing goes through `add_attribute`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<VertexAttribute>", into = "Vec<VertexAttribute>")
)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    stride: usize,
}

impl VertexLayout {
    /// Creates an empty layout, with a stride of zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The layout written by [`DynamicVertexStore`](crate::resource::DynamicVertexStore)
    /// for 2D vertices: `position` (2), `color` (4), `texcoord` (2).
    pub fn position_color_texture() -> Self {
        VertexLayout {
            attributes: vec![
                VertexAttribute {
                    name: "position".to_string(),
                    components: 2,
                },
                VertexAttribute {
                    name: "color".to_string(),
                    components: 4,
                },
                VertexAttribute {
                    name: "texcoord".to_string(),
                    components: 2,
                },
            ],
            stride: 8,
        }
    }

    /// The layout written by
    /// [`DynamicVertexStore::append_vertex3`](crate::resource::DynamicVertexStore::append_vertex3):
    /// `position` (3), `color` (4), `texcoord` (2).
    pub fn position3_color_texture() -> Self {
        let mut layout = Self::position_color_texture();
        layout.attributes[0].components = 3;
        layout.stride = 9;
        layout
    }

    /// Appends an attribute.
    ///
    /// Fails with [`Error::InvalidArgument`] if `components` is zero.
    pub fn add_attribute(&mut self, name: impl Into<String>, components: u32) -> Result<()> {
        let name = name.into();
        if components == 0 {
            return Err(Error::InvalidArgument(format!(
                "attribute `{}` must have at least one component",
                name
            )));
        }

        self.stride += components as usize;
        self.attributes.push(VertexAttribute { name, components });
        Ok(())
    }

    /// Builder version of [`Self::add_attribute`].
    pub fn with_attribute(mut self, name: impl Into<String>, components: u32) -> Result<Self> {
        self.add_attribute(name, components)?;
        Ok(self)
    }

    /// Removes every attribute.
    pub fn clear(&mut self) {
        self.attributes.clear();
        self.stride = 0;
    }

    /// Number of floats per vertex.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of bytes per vertex.
    #[inline]
    pub fn stride_bytes(&self) -> usize {
        self.stride * COMPONENT_SIZE
    }

    #[inline]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Byte offset of the attribute at `index` inside a vertex.
    pub fn resolve_offset(&self, index: usize) -> Option<usize> {
        if index >= self.attributes.len() {
            return None;
        }

        let floats: u32 = self.attributes[..index]
            .iter()
            .map(|a| a.components)
            .sum();
        Some(floats as usize * COMPONENT_SIZE)
    }

    /// Iterates over `(attribute, byte offset)` pairs.
    pub fn offsets(&self) -> impl Iterator<Item = (&VertexAttribute, usize)> {
        self.attributes.iter().scan(0usize, |offset, attribute| {
            let current = *offset;
            *offset += attribute.components as usize * COMPONENT_SIZE;
            Some((attribute, current))
        })
    }

    /// wgpu attributes for this layout, at consecutive shader locations from
    /// `first_location`.
    ///
    /// Returns `None` if an attribute has more than four components, which wgpu can't
    /// express as a single vertex format.
    pub fn wgpu_attributes(&self, first_location: u32) -> Option<Vec<wgpu::VertexAttribute>> {
        self.offsets()
            .zip(first_location..)
            .map(|((attribute, offset), shader_location)| {
                let format = match attribute.components {
                    1 => wgpu::VertexFormat::Float32,
                    2 => wgpu::VertexFormat::Float32x2,
                    3 => wgpu::VertexFormat::Float32x3,
                    4 => wgpu::VertexFormat::Float32x4,
                    _ => return None,
                };
                Some(wgpu::VertexAttribute {
                    format,
                    offset: offset as wgpu::BufferAddress,
                    shader_location,
                })
            })
            .collect()
    }
}

impl TryFrom<Vec<VertexAttribute>> for VertexLayout {
    type Error = Error;

    fn try_from(attributes: Vec<VertexAttribute>) -> Result<Self> {
        let mut layout = VertexLayout::new();
        for attribute in attributes {
            layout.add_attribute(attribute.name, attribute.components)?;
        }
        Ok(layout)
    }
}

impl From<VertexLayout> for Vec<VertexAttribute> {
    fn from(layout: VertexLayout) -> Self {
        layout.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> VertexLayout {
        VertexLayout::new()
            .with_attribute("position", 3)
            .and_then(|l| l.with_attribute("color", 4))
            .and_then(|l| l.with_attribute("texcoord", 2))
            .unwrap()
    }

    #[test]
    fn stride_is_the_sum_of_components() {
        let layout = layout();
        assert_eq!(layout.stride(), 9);
        assert_eq!(layout.stride_bytes(), 36);
        assert_eq!(VertexLayout::position_color_texture().stride(), 8);
        assert_eq!(VertexLayout::position3_color_texture(), self::layout());
    }

    #[test]
    fn zero_components_are_rejected() {
        let mut layout = VertexLayout::new();
        let result = layout.add_attribute("broken", 0);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(layout.is_empty());
        assert_eq!(layout.stride(), 0);
    }

    #[test]
    fn offsets_are_in_bytes() {
        let layout = layout();
        assert_eq!(layout.resolve_offset(0), Some(0));
        assert_eq!(layout.resolve_offset(1), Some(12));
        assert_eq!(layout.resolve_offset(2), Some(28));
        assert_eq!(layout.resolve_offset(3), None);

        let offsets: Vec<usize> = layout.offsets().map(|(_, o)| o).collect();
        assert_eq!(offsets, vec![0, 12, 28]);
    }

    #[test]
    fn attribute_lists_are_validated() {
        let attributes = layout().attributes().to_vec();
        assert_eq!(VertexLayout::try_from(attributes), Ok(layout()));

        let broken = vec![
            VertexAttribute {
                name: "position".to_string(),
                components: 2,
            },
            VertexAttribute {
                name: "bad".to_string(),
                components: 0,
            },
        ];
        assert!(matches!(
            VertexLayout::try_from(broken),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialized_layout_recomputes_stride() {
        let layout: VertexLayout = serde_json::from_str(
            r#"[{"name":"position","components":2},{"name":"color","components":4}]"#,
        )
        .unwrap();
        assert_eq!(layout.stride(), 6);

        let json = serde_json::to_string(&layout).unwrap();
        assert_eq!(serde_json::from_str::<VertexLayout>(&json).unwrap(), layout);

        let zero = r#"[{"name":"position","components":2},{"name":"bad","components":0}]"#;
        assert!(serde_json::from_str::<VertexLayout>(zero).is_err());

        let stale_stride = r#"{"attributes":[{"name":"position","components":2}],"stride":99}"#;
        assert!(serde_json::from_str::<VertexLayout>(stale_stride).is_err());
    }

    #[test]
    fn clear_resets_stride() {
        let mut layout = layout();
        layout.clear();
        assert_eq!(layout.stride(), 0);
        assert!(layout.is_empty());
    }

    #[test]
    fn wgpu_attributes_follow_offsets() {
        let attributes = layout().wgpu_attributes(1).unwrap();
        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(attributes[1].offset, 12);
        assert_eq!(attributes[2].shader_location, 3);

        let wide = VertexLayout::new().with_attribute("matrix", 16).unwrap();
        assert!(wide.wgpu_attributes(0).is_none());
    }
}
