//! Hierarchical layout materialization.
//!
//! Walks a resolved [`DesignDb`] from a chosen starting cell and emits each
//! cell's geometry into a [`GdsLibrary`] exactly once, placing instance
//! references to already-emitted subcells. Shared subcells are never
//! re-materialized: emission is memoized by cell name.

use std::path::Path;

use thiserror::Error;

use cellforge_core::cell::Cell;
use cellforge_core::database::DbError;
use cellforge_core::geometry::{Point, Rect};
use cellforge_core::tech::TechError;
use cellforge_core::{CellIndex, DesignDb, Tech};

use crate::gds::{GdsCell, GdsError, GdsLibrary};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Gds(#[from] GdsError),

    #[error(transparent)]
    Tech(#[from] TechError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Emits the layout of a resolved cell hierarchy as a GDS-II library.
pub struct GdsExporter<'a> {
    db: &'a DesignDb,
    tech: &'a Tech,
}

impl<'a> GdsExporter<'a> {
    pub fn new(db: &'a DesignDb, tech: &'a Tech) -> Self {
        Self { db, tech }
    }

    /// Materialize the hierarchy rooted at `cell` and write it to `path`.
    pub fn write_layout(&self, cell: CellIndex, path: &Path) -> Result<(), ExportError> {
        let lib = self.export(cell)?;
        lib.write_to_file(path)?;
        log::info!(
            "wrote layout of cell '{}' to {}",
            lib.name,
            path.display()
        );
        Ok(())
    }

    /// Materialize the hierarchy rooted at `cell` into a fresh library
    /// configured from the technology unit parameters.
    pub fn export(&self, cell: CellIndex) -> Result<GdsLibrary, ExportError> {
        let top = self.lookup(cell)?;
        let units = self.tech.units();
        let mut lib = GdsLibrary::new(&top.name);
        lib.header = units.gds_header;
        lib.dbu_uu = units.dbu_uu;
        lib.dbu_m = units.dbu_m;
        lib.skip_text_type = true;
        self.materialize_into(&mut lib, cell)?;
        Ok(lib)
    }

    /// Materialize the hierarchy rooted at `cell` into an existing library.
    ///
    /// Cells already present in the library are left untouched, so re-running
    /// the same materialization is a no-op.
    pub fn materialize_into(&self, lib: &mut GdsLibrary, cell: CellIndex) -> Result<(), ExportError> {
        if !self.db.is_resolved() {
            return Err(DbError::NotResolved.into());
        }
        self.add_cell_graph(lib, cell)
    }

    fn lookup(&self, idx: CellIndex) -> Result<&'a Cell, ExportError> {
        self.db.cell(idx).ok_or_else(|| DbError::UnknownCell(idx).into())
    }

    fn add_cell_graph(&self, lib: &mut GdsLibrary, idx: CellIndex) -> Result<(), ExportError> {
        let cell = self.lookup(idx)?;
        if lib.contains_cell(&cell.name) {
            return Ok(());
        }

        let mut gds_cell = GdsCell::new(&cell.name);

        for (layer, shapes) in cell.layout().iter_layers() {
            if shapes.rects.is_empty() && shapes.texts.is_empty() {
                continue;
            }
            let gds_layer = self.tech.layer_to_gds(layer)?;
            for drawn in &shapes.rects {
                gds_cell.add_boundary(gds_layer, drawn.datatype, closed_outline(&drawn.rect));
            }
            for label in &shapes.texts {
                gds_cell.add_text(gds_layer, 0, label.coord, &label.text);
            }
        }

        // Subcells are materialized before the reference that places them,
        // so every SREF names a cell that already exists in the library.
        for node in cell.nodes() {
            let Some(child) = node.subcell() else {
                continue;
            };
            self.add_cell_graph(lib, child)?;
            let child_name = &self.lookup(child)?.name;
            let (angle, reflect) = node.orient.to_gds();
            gds_cell.add_sref(child_name, node.offset, angle, 1.0, reflect);
        }

        log::debug!("materialized cell '{}'", gds_cell.name);
        lib.add_cell(gds_cell)?;
        Ok(())
    }
}

/// The closed 5-point outline of a rectangle: lower-left, upper-left,
/// upper-right, lower-right, back to lower-left.
fn closed_outline(rect: &Rect) -> Vec<Point> {
    vec![
        Point::new(rect.x_lo(), rect.y_lo()),
        Point::new(rect.x_lo(), rect.y_hi()),
        Point::new(rect.x_hi(), rect.y_hi()),
        Point::new(rect.x_hi(), rect.y_lo()),
        Point::new(rect.x_lo(), rect.y_lo()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gds::GdsElement;
    use cellforge_core::cell::{Instance, Orient};
    use cellforge_core::tech::TechUnits;

    /// TOP places LEFT and RIGHT; both place the same leaf-bearing SHARED.
    fn diamond_db() -> (DesignDb, CellIndex) {
        let mut db = DesignDb::new();
        let top = db.add_cell("TOP").unwrap();
        let left = db.add_cell("LEFT").unwrap();
        let right = db.add_cell("RIGHT").unwrap();
        let shared = db.add_cell("SHARED").unwrap();

        db.cell_mut(top)
            .unwrap()
            .layout_mut()
            .add_rect(0, Rect::new(0, 0, 100, 20), 0);
        db.cell_mut(top)
            .unwrap()
            .add_node(Instance::reference(left, Point::new(0, 0), Orient::R0));
        db.cell_mut(top)
            .unwrap()
            .add_node(Instance::reference(right, Point::new(50, 0), Orient::MX));

        db.cell_mut(left)
            .unwrap()
            .add_node(Instance::reference(shared, Point::new(5, 5), Orient::R0));
        db.cell_mut(right)
            .unwrap()
            .add_node(Instance::reference(shared, Point::new(10, 5), Orient::R90));

        let shared_cell = db.cell_mut(shared).unwrap();
        shared_cell.layout_mut().add_rect(1, Rect::new(0, 0, 10, 10), 40);
        shared_cell
            .layout_mut()
            .add_text(1, "sub", Point::new(5, 5));
        shared_cell.add_node(Instance::leaf(Point::new(0, 0)));

        db.resolve_root().unwrap();
        (db, top)
    }

    fn two_layer_tech() -> Tech {
        let mut tech = Tech::new(TechUnits::default());
        tech.add_layer("metal1", 31);
        tech.add_layer("metal2", 32);
        tech
    }

    fn srefs_to<'a>(cell: &'a GdsCell, name: &str) -> Vec<&'a GdsElement> {
        cell.elements()
            .iter()
            .filter(|e| matches!(e, GdsElement::Sref { cell, .. } if cell == name))
            .collect()
    }

    #[test]
    fn test_shared_subcell_emitted_once() {
        let (db, top) = diamond_db();
        let tech = two_layer_tech();
        let lib = GdsExporter::new(&db, &tech).export(top).unwrap();

        assert_eq!(lib.cell_count(), 4);
        assert!(lib.contains_cell("SHARED"));

        // Exactly one definition of SHARED, referenced from both siblings.
        assert_eq!(srefs_to(lib.cell("LEFT").unwrap(), "SHARED").len(), 1);
        assert_eq!(srefs_to(lib.cell("RIGHT").unwrap(), "SHARED").len(), 1);

        // Children are defined before their first referencing parent.
        let order: Vec<_> = lib.cells().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(order, vec!["SHARED", "LEFT", "RIGHT", "TOP"]);
    }

    #[test]
    fn test_rects_become_closed_boundaries() {
        let (db, top) = diamond_db();
        let tech = two_layer_tech();
        let lib = GdsExporter::new(&db, &tech).export(top).unwrap();

        let shared = lib.cell("SHARED").unwrap();
        let boundary = shared
            .elements()
            .iter()
            .find_map(|e| match e {
                GdsElement::Boundary {
                    layer,
                    datatype,
                    points,
                } => Some((*layer, *datatype, points.clone())),
                _ => None,
            })
            .unwrap();
        assert_eq!(boundary.0, 32);
        assert_eq!(boundary.1, 40);
        assert_eq!(
            boundary.2,
            vec![
                Point::new(0, 0),
                Point::new(0, 10),
                Point::new(10, 10),
                Point::new(10, 0),
                Point::new(0, 0),
            ]
        );
    }

    #[test]
    fn test_orientation_maps_to_angle_and_reflect() {
        let (db, top) = diamond_db();
        let tech = two_layer_tech();
        let lib = GdsExporter::new(&db, &tech).export(top).unwrap();

        let top_cell = lib.cell("TOP").unwrap();
        match srefs_to(top_cell, "RIGHT")[0] {
            GdsElement::Sref {
                origin,
                angle,
                reflect,
                ..
            } => {
                assert_eq!(*origin, Point::new(50, 0));
                assert_eq!(*angle, 0.0);
                assert!(*reflect);
            }
            _ => unreachable!(),
        }
        match srefs_to(lib.cell("RIGHT").unwrap(), "SHARED")[0] {
            GdsElement::Sref { angle, reflect, .. } => {
                assert_eq!(*angle, 90.0);
                assert!(!*reflect);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_leaf_nodes_emit_nothing() {
        let (db, top) = diamond_db();
        let tech = two_layer_tech();
        let lib = GdsExporter::new(&db, &tech).export(top).unwrap();

        let shared = lib.cell("SHARED").unwrap();
        assert!(srefs_to(shared, "SHARED").is_empty());
        assert!(!shared
            .elements()
            .iter()
            .any(|e| matches!(e, GdsElement::Sref { .. })));
    }

    #[test]
    fn test_rematerialization_is_a_noop() {
        let (db, top) = diamond_db();
        let tech = two_layer_tech();
        let exporter = GdsExporter::new(&db, &tech);
        let mut lib = exporter.export(top).unwrap();

        exporter.materialize_into(&mut lib, top).unwrap();
        assert_eq!(lib.cell_count(), 4);
        assert_eq!(srefs_to(lib.cell("TOP").unwrap(), "LEFT").len(), 1);
    }

    #[test]
    fn test_library_takes_tech_units() {
        let (db, top) = diamond_db();
        let tech = two_layer_tech();
        let lib = GdsExporter::new(&db, &tech).export(top).unwrap();
        assert_eq!(lib.name, "TOP");
        assert_eq!(lib.header, 600);
        assert_eq!(lib.dbu_uu, 1e-3);
        assert_eq!(lib.dbu_m, 1e-9);
        assert!(lib.skip_text_type);
    }

    #[test]
    fn test_unmapped_layer_is_fatal() {
        let (db, top) = diamond_db();
        // Only one layer mapped; SHARED draws on layer index 1.
        let mut tech = Tech::new(TechUnits::default());
        tech.add_layer("metal1", 31);
        let err = GdsExporter::new(&db, &tech).export(top).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Tech(TechError::UnmappedLayer(1))
        ));
    }

    #[test]
    fn test_unresolved_database_rejected() {
        let mut db = DesignDb::new();
        let top = db.add_cell("TOP").unwrap();
        let tech = two_layer_tech();
        let err = GdsExporter::new(&db, &tech).export(top).unwrap_err();
        assert!(matches!(err, ExportError::Db(DbError::NotResolved)));
    }

    #[test]
    fn test_unknown_start_cell_rejected() {
        let (db, _) = diamond_db();
        let tech = two_layer_tech();
        let err = GdsExporter::new(&db, &tech).export(42).unwrap_err();
        assert!(matches!(err, ExportError::Db(DbError::UnknownCell(42))));
    }
}
