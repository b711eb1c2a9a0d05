use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Rect};

/// Index of a cell in the [`crate::DesignDb`] arena.
///
/// Instance nodes hold this non-owning index; any number of nodes across the
/// hierarchy may reference the same cell definition.
pub type CellIndex = usize;

/// One of the eight standard 2D rigid transforms: four rotations, each with
/// an optional mirror about the x axis applied first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orient {
    R0,
    R90,
    R180,
    R270,
    /// Mirror about the x axis.
    MX,
    /// Mirror about the x axis, then rotate 90 degrees.
    MX90,
    /// Mirror about the y axis (mirror about x, then rotate 180 degrees).
    MY,
    /// Mirror about the y axis, then rotate 90 degrees.
    MY90,
}

impl Default for Orient {
    fn default() -> Self {
        Orient::R0
    }
}

impl Orient {
    /// The GDS placement parameters for this orientation: rotation angle in
    /// degrees and the reflect (STRANS) flag. The mapping is total.
    pub fn to_gds(self) -> (f64, bool) {
        match self {
            Orient::R0 => (0.0, false),
            Orient::R90 => (90.0, false),
            Orient::R180 => (180.0, false),
            Orient::R270 => (270.0, false),
            Orient::MX => (0.0, true),
            Orient::MX90 => (90.0, true),
            Orient::MY => (180.0, true),
            Orient::MY90 => (270.0, true),
        }
    }
}

/// What an instance node stands for: a terminal primitive with no further
/// hierarchy, or a reference to another cell in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceKind {
    Leaf,
    Ref(CellIndex),
}

/// An instance node owned by exactly one cell: a placement of either a
/// terminal primitive or a subcell reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub kind: InstanceKind,
    pub offset: Point,
    pub orient: Orient,
}

impl Instance {
    pub fn leaf(offset: Point) -> Self {
        Self {
            kind: InstanceKind::Leaf,
            offset,
            orient: Orient::R0,
        }
    }

    pub fn reference(cell: CellIndex, offset: Point, orient: Orient) -> Self {
        Self {
            kind: InstanceKind::Ref(cell),
            offset,
            orient,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, InstanceKind::Leaf)
    }

    /// The referenced subcell, `None` for leaf nodes.
    pub fn subcell(&self) -> Option<CellIndex> {
        match self.kind {
            InstanceKind::Leaf => None,
            InstanceKind::Ref(idx) => Some(idx),
        }
    }
}

/// A rectangle drawn on a layer, tagged with its GDS datatype code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawnRect {
    pub rect: Rect,
    pub datatype: i16,
}

/// A text annotation placed on a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextLabel {
    pub text: String,
    pub coord: Point,
}

/// The shapes drawn on one layer of a cell's layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerShapes {
    pub rects: Vec<DrawnRect>,
    pub texts: Vec<TextLabel>,
}

/// Per-layer layout geometry of a cell, addressed by internal layer index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellLayout {
    layers: Vec<LayerShapes>,
}

impl CellLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn shapes(&self, layer: usize) -> Option<&LayerShapes> {
        self.layers.get(layer)
    }

    pub fn iter_layers(&self) -> impl Iterator<Item = (usize, &LayerShapes)> {
        self.layers.iter().enumerate()
    }

    pub fn add_rect(&mut self, layer: usize, rect: Rect, datatype: i16) {
        self.grow_to(layer);
        self.layers[layer].rects.push(DrawnRect { rect, datatype });
    }

    pub fn add_text(&mut self, layer: usize, text: &str, coord: Point) {
        self.grow_to(layer);
        self.layers[layer].texts.push(TextLabel {
            text: text.to_string(),
            coord,
        });
    }

    fn grow_to(&mut self, layer: usize) {
        if layer >= self.layers.len() {
            self.layers.resize_with(layer + 1, LayerShapes::default);
        }
    }

    /// Bounding box over all drawn rectangles, `None` for an empty layout.
    pub fn bbox(&self) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for shapes in &self.layers {
            for drawn in &shapes.rects {
                match result.as_mut() {
                    Some(r) => r.union_with(&drawn.rect),
                    None => result = Some(drawn.rect),
                }
            }
        }
        result
    }
}

/// A sub-circuit: a named, reusable unit of layout geometry and hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub name: String,
    nodes: Vec<Instance>,
    layout: CellLayout,
}

impl Cell {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            nodes: Vec::new(),
            layout: CellLayout::new(),
        }
    }

    /// Append an instance node, returning its index. Traversals visit
    /// children in this insertion order.
    pub fn add_node(&mut self, node: Instance) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, idx: usize) -> Option<&Instance> {
        self.nodes.get(idx)
    }

    pub fn nodes(&self) -> &[Instance] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn layout(&self) -> &CellLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut CellLayout {
        &mut self.layout
    }
}
