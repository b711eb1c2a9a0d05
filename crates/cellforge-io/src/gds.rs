//! In-memory GDS-II library model and binary stream writer.
//!
//! GDS-II is the industry-standard hierarchical layout interchange format.
//! The emitter in [`crate::emit`] fills a [`GdsLibrary`] with named cells,
//! boundary/text elements, and cell references; [`GdsLibrary::write_to`]
//! then serializes the whole artifact as a GDS-II record stream:
//! `[2-byte length][2-byte record type][payload]` per record, big endian.

use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use cellforge_core::geometry::Point;

// ── GDS-II Record Types ──────────────────────────────────────────────

mod record_type {
    pub const HEADER: u16 = 0x0002;
    pub const BGNLIB: u16 = 0x0102;
    pub const LIBNAME: u16 = 0x0206;
    pub const UNITS: u16 = 0x0305;
    pub const ENDLIB: u16 = 0x0400;
    pub const BGNSTR: u16 = 0x0502;
    pub const STRNAME: u16 = 0x0606;
    pub const ENDSTR: u16 = 0x0700;
    pub const BOUNDARY: u16 = 0x0800;
    pub const SREF: u16 = 0x0A00;
    pub const TEXT: u16 = 0x0C00;
    pub const LAYER: u16 = 0x0D02;
    pub const DATATYPE: u16 = 0x0E02;
    pub const XY: u16 = 0x1003;
    pub const ENDEL: u16 = 0x1100;
    pub const SNAME: u16 = 0x1206;
    pub const TEXTTYPE: u16 = 0x1602;
    pub const PRESENTATION: u16 = 0x1701;
    pub const STRING: u16 = 0x1906;
    pub const STRANS: u16 = 0x1A01;
    pub const MAG: u16 = 0x1B05;
    pub const ANGLE: u16 = 0x1C05;
}

/// Text presentation code: font 0, vertically centered, horizontally left.
const TEXT_PRESENTATION: i16 = 5;
/// Text magnification used for all labels.
const TEXT_MAG: f64 = 0.2;

// ── Errors ────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum GdsError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("cell '{0}' is already defined in the library")]
    DuplicateCell(String),
}

// ── Library model ─────────────────────────────────────────────────────

/// A single element of a GDS cell.
#[derive(Debug, Clone, PartialEq)]
pub enum GdsElement {
    /// A closed polygon on a layer. Callers provide the closing point.
    Boundary {
        layer: i16,
        datatype: i16,
        points: Vec<Point>,
    },
    /// A text label.
    Text {
        layer: i16,
        texttype: i16,
        origin: Point,
        string: String,
    },
    /// A reference to another cell of the library, placed at `origin` with
    /// a rotation angle in degrees and an optional reflection.
    Sref {
        cell: String,
        origin: Point,
        angle: f64,
        mag: f64,
        reflect: bool,
    },
}

/// A named cell (structure) in the output library.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GdsCell {
    pub name: String,
    elements: Vec<GdsElement>,
}

impl GdsCell {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            elements: Vec::new(),
        }
    }

    pub fn add_boundary(&mut self, layer: i16, datatype: i16, points: Vec<Point>) {
        self.elements.push(GdsElement::Boundary {
            layer,
            datatype,
            points,
        });
    }

    pub fn add_text(&mut self, layer: i16, texttype: i16, origin: Point, string: &str) {
        self.elements.push(GdsElement::Text {
            layer,
            texttype,
            origin,
            string: string.to_string(),
        });
    }

    pub fn add_sref(&mut self, cell: &str, origin: Point, angle: f64, mag: f64, reflect: bool) {
        self.elements.push(GdsElement::Sref {
            cell: cell.to_string(),
            origin,
            angle,
            mag,
            reflect,
        });
    }

    pub fn elements(&self) -> &[GdsElement] {
        &self.elements
    }
}

/// The whole output artifact: header/unit parameters plus an ordered list
/// of uniquely named cells.
#[derive(Debug, Clone)]
pub struct GdsLibrary {
    pub name: String,
    /// Stream format version, e.g. 600.
    pub header: i16,
    /// Database unit in user units.
    pub dbu_uu: f64,
    /// Database unit in meters.
    pub dbu_m: f64,
    /// When set, the TEXTTYPE record of every text element is omitted from
    /// the stream, so readers never see the keyword.
    pub skip_text_type: bool,
    cells: Vec<GdsCell>,
    names: HashSet<String>,
}

impl GdsLibrary {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            header: 600,
            dbu_uu: 1e-3,
            dbu_m: 1e-9,
            skip_text_type: false,
            cells: Vec::new(),
            names: HashSet::new(),
        }
    }

    /// Whether a cell with this name has already been added.
    pub fn contains_cell(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn cell(&self, name: &str) -> Option<&GdsCell> {
        self.cells.iter().find(|c| c.name == name)
    }

    pub fn cells(&self) -> &[GdsCell] {
        &self.cells
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Add a fully built cell; names are unique within a library.
    pub fn add_cell(&mut self, cell: GdsCell) -> Result<(), GdsError> {
        if !self.names.insert(cell.name.clone()) {
            return Err(GdsError::DuplicateCell(cell.name));
        }
        self.cells.push(cell);
        Ok(())
    }

    /// Serialize the library as a GDS-II record stream.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), GdsError> {
        let mut sw = StreamWriter { writer };
        sw.write_i16_record(record_type::HEADER, &[self.header])?;
        sw.write_i16_record(record_type::BGNLIB, &[0; 12])?;
        sw.write_string_record(record_type::LIBNAME, &self.name)?;
        sw.write_real8_record(record_type::UNITS, &[self.dbu_uu, self.dbu_m])?;
        for cell in &self.cells {
            self.write_cell(&mut sw, cell)?;
        }
        sw.write_record(record_type::ENDLIB, &[])?;
        log::debug!(
            "serialized GDS library '{}' with {} cells",
            self.name,
            self.cells.len()
        );
        Ok(())
    }

    /// Serialize the library to a file on disk.
    pub fn write_to_file(&self, path: &Path) -> Result<(), GdsError> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    fn write_cell<W: Write>(&self, sw: &mut StreamWriter<W>, cell: &GdsCell) -> Result<(), GdsError> {
        sw.write_i16_record(record_type::BGNSTR, &[0; 12])?;
        sw.write_string_record(record_type::STRNAME, &cell.name)?;
        for element in cell.elements() {
            match element {
                GdsElement::Boundary {
                    layer,
                    datatype,
                    points,
                } => {
                    sw.write_record(record_type::BOUNDARY, &[])?;
                    sw.write_i16_record(record_type::LAYER, &[*layer])?;
                    sw.write_i16_record(record_type::DATATYPE, &[*datatype])?;
                    let coords: Vec<i32> = points
                        .iter()
                        .flat_map(|p| [p.x as i32, p.y as i32])
                        .collect();
                    sw.write_i32_record(record_type::XY, &coords)?;
                    sw.write_record(record_type::ENDEL, &[])?;
                }
                GdsElement::Text {
                    layer,
                    texttype,
                    origin,
                    string,
                } => {
                    sw.write_record(record_type::TEXT, &[])?;
                    sw.write_i16_record(record_type::LAYER, &[*layer])?;
                    if !self.skip_text_type {
                        sw.write_i16_record(record_type::TEXTTYPE, &[*texttype])?;
                    }
                    sw.write_i16_record(record_type::PRESENTATION, &[TEXT_PRESENTATION])?;
                    sw.write_real8_record(record_type::MAG, &[TEXT_MAG])?;
                    sw.write_i32_record(record_type::XY, &[origin.x as i32, origin.y as i32])?;
                    sw.write_string_record(record_type::STRING, string)?;
                    sw.write_record(record_type::ENDEL, &[])?;
                }
                GdsElement::Sref {
                    cell: target,
                    origin,
                    angle,
                    mag,
                    reflect,
                } => {
                    sw.write_record(record_type::SREF, &[])?;
                    sw.write_string_record(record_type::SNAME, target)?;
                    if *reflect {
                        // Bit 0 (0x8000) of STRANS: reflect about the x axis.
                        sw.write_i16_record(record_type::STRANS, &[i16::MIN])?;
                    } else if *angle != 0.0 || *mag != 1.0 {
                        sw.write_i16_record(record_type::STRANS, &[0])?;
                    }
                    if *mag != 1.0 {
                        sw.write_real8_record(record_type::MAG, &[*mag])?;
                    }
                    if *angle != 0.0 {
                        sw.write_real8_record(record_type::ANGLE, &[*angle])?;
                    }
                    sw.write_i32_record(record_type::XY, &[origin.x as i32, origin.y as i32])?;
                    sw.write_record(record_type::ENDEL, &[])?;
                }
            }
        }
        sw.write_record(record_type::ENDSTR, &[])?;
        Ok(())
    }
}

// ── Record-level stream writer ────────────────────────────────────────

struct StreamWriter<W: Write> {
    writer: W,
}

impl<W: Write> StreamWriter<W> {
    fn write_record(&mut self, record_type: u16, data: &[u8]) -> Result<(), GdsError> {
        let total_len = (data.len() + 4) as u16;
        self.writer.write_all(&total_len.to_be_bytes())?;
        self.writer.write_all(&record_type.to_be_bytes())?;
        if !data.is_empty() {
            self.writer.write_all(data)?;
        }
        Ok(())
    }

    fn write_i16_record(&mut self, record_type: u16, values: &[i16]) -> Result<(), GdsError> {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(record_type, &data)
    }

    fn write_i32_record(&mut self, record_type: u16, values: &[i32]) -> Result<(), GdsError> {
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_be_bytes()).collect();
        self.write_record(record_type, &data)
    }

    fn write_string_record(&mut self, record_type: u16, s: &str) -> Result<(), GdsError> {
        let mut data: Vec<u8> = s.bytes().collect();
        // GDS strings must be even length
        if data.len() % 2 != 0 {
            data.push(0);
        }
        self.write_record(record_type, &data)
    }

    fn write_real8_record(&mut self, record_type: u16, values: &[f64]) -> Result<(), GdsError> {
        let data: Vec<u8> = values.iter().flat_map(|v| f64_to_gds_real8(*v)).collect();
        self.write_record(record_type, &data)
    }
}

/// Convert IEEE 754 f64 to GDS-II excess-64 real format.
fn f64_to_gds_real8(value: f64) -> [u8; 8] {
    if value == 0.0 {
        return [0u8; 8];
    }

    let sign_bit: u8 = if value < 0.0 { 0x80 } else { 0x00 };
    let mut val = value.abs();

    // Find exponent such that 1/16 <= mantissa < 1
    let mut exponent: i32 = 1;
    while val >= 1.0 && exponent < 127 {
        val /= 16.0;
        exponent += 1;
    }
    while val < 1.0 / 16.0 && exponent > -64 {
        val *= 16.0;
        exponent -= 1;
    }

    let mantissa = (val * (1u64 << 56) as f64) as u64;
    let exp_byte = sign_bit | ((exponent + 64) as u8 & 0x7F);

    let mut result = [0u8; 8];
    result[0] = exp_byte;
    result[1] = ((mantissa >> 48) & 0xFF) as u8;
    result[2] = ((mantissa >> 40) & 0xFF) as u8;
    result[3] = ((mantissa >> 32) & 0xFF) as u8;
    result[4] = ((mantissa >> 24) & 0xFF) as u8;
    result[5] = ((mantissa >> 16) & 0xFF) as u8;
    result[6] = ((mantissa >> 8) & 0xFF) as u8;
    result[7] = (mantissa & 0xFF) as u8;
    result
}
