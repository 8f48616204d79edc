//! XLSX workbook export
//!
//! The workbook is a plain SpreadsheetML package written part by part into
//! a zip archive: content types, relationships, the workbook, one style
//! sheet and one worksheet per table. Strings are stored inline, every
//! sheet freezes its header row and sets fixed column widths.
//!
//! Sheet names and header texts are consumed by downstream tooling and must
//! not change.

use crate::error::ExportResult;
use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;
use stentkit_core::InputDocument;
use stentkit_geometry::{Cell, Derivation, EdgePosition};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const SHEET_NAMES: [&str; 7] = [
    "KEY",
    "Parameters",
    "LinkMatrix",
    "GapsMatrix",
    "ColumnScale",
    "RingHeights",
    "Cells",
];

pub const CELL_HEADERS: [&str; 25] = [
    "ring",
    "col",
    "x_left_mm",
    "x_right_mm",
    "y_top_edge_mm",
    "y_bottom_edge_mm",
    "left_pos",
    "right_pos",
    "Rc_mm",
    "theta_deg",
    "delta_deg",
    "c_center_mm",
    "s_center_mm",
    "M_mm",
    "x_keepout_mm",
    "x_keepout_raw_mm",
    "x_keepout_max_mm",
    "alpha_deg",
    "left_cl_x1",
    "left_cl_y",
    "left_cl_x2",
    "right_cl_x1",
    "right_cl_y",
    "right_cl_x2",
    "fault",
];

const CELL_WIDTHS: [f64; 25] = [
    8.0, 8.0, 14.0, 14.0, 14.0, 14.0, 10.0, 10.0, 10.0, 10.0, 10.0, 12.0, 12.0, 12.0, 12.0,
    12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 12.0, 40.0,
];

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Empty,
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Option<f64>> for Value {
    fn from(v: Option<f64>) -> Self {
        v.map_or(Self::Empty, Self::Number)
    }
}

/// A named table with a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub widths: Vec<f64>,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    fn new(name: &str, headers: Vec<String>, widths: Vec<f64>) -> Self {
        Self {
            name: name.to_string(),
            headers,
            widths,
            rows: Vec::new(),
        }
    }

    fn push(&mut self, row: Vec<Value>) {
        self.rows.push(row);
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
        );
        xml.push_str(
            "<sheetViews><sheetView workbookViewId=\"0\">\
             <pane ySplit=\"1\" topLeftCell=\"A2\" activePane=\"bottomLeft\" state=\"frozen\"/>\
             </sheetView></sheetViews>",
        );

        if !self.widths.is_empty() {
            xml.push_str("<cols>");
            for (i, w) in self.widths.iter().enumerate() {
                xml.push_str(&format!(
                    "<col min=\"{n}\" max=\"{n}\" width=\"{w}\" customWidth=\"1\"/>",
                    n = i + 1
                ));
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        xml.push_str("<row r=\"1\">");
        for (c, header) in self.headers.iter().enumerate() {
            xml.push_str(&format!(
                "<c r=\"{}1\" t=\"inlineStr\" s=\"1\"><is><t>{}</t></is></c>",
                column_letter(c),
                escape(header)
            ));
        }
        xml.push_str("</row>");

        for (r, row) in self.rows.iter().enumerate() {
            let rn = r + 2;
            xml.push_str(&format!("<row r=\"{rn}\">"));
            for (c, value) in row.iter().enumerate() {
                let cref = format!("{}{}", column_letter(c), rn);
                match value {
                    Value::Number(v) if v.is_finite() => {
                        xml.push_str(&format!("<c r=\"{cref}\"><v>{v}</v></c>"));
                    }
                    Value::Text(s) => {
                        xml.push_str(&format!(
                            "<c r=\"{cref}\" t=\"inlineStr\"><is><t>{}</t></is></c>",
                            escape(s)
                        ));
                    }
                    Value::Number(_) | Value::Empty => {}
                }
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData></worksheet>");
        xml
    }
}

/// Spreadsheet column name for a 0-based index: A..Z, AA..
pub fn column_letter(index: usize) -> String {
    let mut n = index + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        name.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

/// Escape markup and replace characters XML 1.0 does not allow.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                out.push(char::REPLACEMENT_CHARACTER)
            }
            c => out.push(c),
        }
    }
    out
}

fn edge_name(pos: EdgePosition) -> &'static str {
    match pos {
        EdgePosition::Top => "top",
        EdgePosition::Bottom => "bottom",
    }
}

/// All sheets of a derivation, in output order.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn from_derivation(input: &InputDocument, derived: &Derivation) -> Self {
        let params = &input.parameters;
        let crowns = params.crowns_per_ring;
        let interfaces = input.interface_labels();
        let col_headers: Vec<String> = input
            .column_labels()
            .iter()
            .map(|l| format!("col_{l}"))
            .collect();

        let mut key = Sheet::new(
            "KEY",
            vec!["sheet".into(), "purpose".into()],
            vec![24.0, 84.0],
        );
        for (sheet, purpose) in [
            ("Parameters", "Global inputs, derived pitch/circumference."),
            ("LinkMatrix", "Interfaces×columns: 1=link, 0=no link."),
            ("GapsMatrix", "Derived from LinkMatrix + GapsPolicy."),
            ("ColumnScale", "Per-column scale to close L."),
            ("RingHeights", "Ring heights (mm) by column."),
            ("Cells", "Per-cell chords, edges, keep-out & geometry."),
        ] {
            key.push(vec![sheet.into(), purpose.into()]);
        }

        let mut parameters = Sheet::new(
            "Parameters",
            vec!["Parameter".into(), "Value".into(), "Units".into(), "Notes".into()],
            vec![28.0, 16.0, 10.0, 44.0],
        );
        let mut param_row = |name: &str, value: Value, units: &str, notes: &str| {
            parameters.push(vec![name.into(), value, units.into(), notes.into()]);
        };
        param_row("diameter_mm", params.diameter_mm.into(), "mm", "Expanded OD");
        param_row("length_mm", params.length_mm.into(), "mm", "Total axial length");
        param_row("num_rings", params.num_rings.into(), "", "Axial rings");
        param_row(
            "crowns_per_ring",
            params.crowns_per_ring.into(),
            "",
            "Crowns per ring (columns)",
        );
        param_row("circumference_mm", params.circumference_mm().into(), "mm", "π·D");
        param_row("pitch_mm", params.pitch_mm().into(), "mm", "circumference / N");
        param_row("R_factor", params.r_factor.into(), "", "Rc = R_factor × w");
        param_row(
            "x_keepout_min_mm",
            params.x_keepout_min_mm.into(),
            "mm",
            "Min lateral keep-out",
        );
        if let Some(fold_lock) = &input.fold_lock {
            param_row(
                "balloon_material",
                fold_lock.balloon_material.as_str().into(),
                "",
                "Fold-lock table row",
            );
            param_row(
                "balloon_wall_um",
                fold_lock.balloon_wall_um.into(),
                "µm",
                "Fold-lock table band",
            );
            param_row(
                "fold_lock_gap_mm",
                fold_lock.gap_mm().into(),
                "mm",
                "Replaces end_linked_mm",
            );
        }

        let matrix_widths = || {
            let mut w = vec![16.0];
            w.extend(std::iter::repeat(10.0).take(crowns));
            w
        };
        let mut headers = vec!["interface".to_string()];
        headers.extend(col_headers.iter().cloned());

        let mut links = Sheet::new("LinkMatrix", headers.clone(), matrix_widths());
        for (label, row) in interfaces.iter().zip(input.links.matrix.to_rows()) {
            let mut values: Vec<Value> = vec![label.as_str().into()];
            values.extend(row.into_iter().map(|v| Value::Number(f64::from(v))));
            links.push(values);
        }

        let mut gaps = Sheet::new("GapsMatrix", headers, matrix_widths());
        for (label, row) in interfaces.iter().zip(derived.gaps_matrix.to_rows()) {
            let mut values: Vec<Value> = vec![label.as_str().into()];
            values.extend(row.into_iter().map(Value::Number));
            gaps.push(values);
        }

        let mut scale = Sheet::new(
            "ColumnScale",
            vec![
                "col".into(),
                "sum_gaps_in_col_mm".into(),
                "scale_mm_per_factor".into(),
            ],
            vec![10.0, 22.0, 22.0],
        );
        for col in 0..derived.columns() {
            let s = derived.column_scale(col);
            scale.push(vec![
                col.into(),
                s.sum_gaps_mm.into(),
                s.scale_mm_per_factor.into(),
            ]);
        }

        let mut ring_headers = vec!["ring".to_string()];
        ring_headers.extend((0..crowns).map(|c| format!("col_{c}")));
        let mut ring_widths = vec![10.0];
        ring_widths.extend(std::iter::repeat(14.0).take(crowns));
        let mut heights = Sheet::new("RingHeights", ring_headers, ring_widths);
        for (r, row) in derived.ring_heights_mm.to_rows().into_iter().enumerate() {
            let mut values: Vec<Value> = vec![(r + 1).into()];
            values.extend(row.into_iter().map(Value::Number));
            heights.push(values);
        }

        let mut cells = Sheet::new(
            "Cells",
            CELL_HEADERS.iter().map(|h| h.to_string()).collect(),
            CELL_WIDTHS.to_vec(),
        );
        for cell in &derived.cells {
            cells.push(cell_row(cell));
        }

        Self {
            sheets: vec![key, parameters, links, gaps, scale, heights, cells],
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Write the workbook package to `writer`.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> ExportResult<()> {
        let mut zip = ZipWriter::new(writer);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(self.content_types().as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(self.workbook_xml().as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(self.workbook_rels().as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(STYLES.as_bytes())?;

        for (i, sheet) in self.sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(sheet.to_xml().as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }

    pub fn save(&self, path: &Path) -> ExportResult<()> {
        let file = File::create(path)?;
        self.write_to(file)?;
        tracing::debug!("Workbook written: {} ({} sheets)", path.display(), self.sheets.len());
        Ok(())
    }

    fn content_types(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
             <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
             <Default Extension=\"xml\" ContentType=\"application/xml\"/>\
             <Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
             <Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>",
        );
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                "<Override PartName=\"/xl/worksheets/sheet{i}.xml\" \
                 ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>"
            ));
        }
        xml.push_str("</Types>");
        xml
    }

    fn workbook_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
             xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheets>",
        );
        for (i, sheet) in self.sheets.iter().enumerate() {
            xml.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>",
                escape(&sheet.name),
                n = i + 1
            ));
        }
        xml.push_str("</sheets></workbook>");
        xml
    }

    fn workbook_rels(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        );
        for i in 1..=self.sheets.len() {
            xml.push_str(&format!(
                "<Relationship Id=\"rId{i}\" \
                 Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" \
                 Target=\"worksheets/sheet{i}.xml\"/>"
            ));
        }
        xml.push_str(&format!(
            "<Relationship Id=\"rId{}\" \
             Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" \
             Target=\"styles.xml\"/></Relationships>",
            self.sheets.len() + 1
        ));
        xml
    }
}

fn cell_row(cell: &Cell) -> Vec<Value> {
    let g = cell.geometry.as_ref();
    let num = |f: fn(&stentkit_geometry::CellGeometry) -> f64| Value::from(g.map(f));

    vec![
        cell.ring.into(),
        cell.col.into(),
        cell.x_left_mm.into(),
        cell.x_right_mm.into(),
        num(|g| g.y_top_edge_mm),
        num(|g| g.y_bottom_edge_mm),
        edge_name(cell.left_crown_pos).into(),
        edge_name(cell.right_crown_pos).into(),
        num(|g| g.rc_mm),
        num(|g| g.theta_deg),
        num(|g| g.delta_deg),
        num(|g| g.chord_center_len_mm),
        num(|g| g.sagitta_center_mm),
        num(|g| g.m_mm),
        num(|g| g.x_keepout_mm),
        num(|g| g.x_keepout_raw_mm),
        num(|g| g.x_keepout_max_mm),
        num(|g| g.alpha_deg),
        num(|g| g.left_cl.start()[0]),
        num(|g| g.left_cl.start()[1]),
        num(|g| g.left_cl.end()[0]),
        num(|g| g.right_cl.start()[0]),
        num(|g| g.right_cl.start()[1]),
        num(|g| g.right_cl.end()[0]),
        cell.fault
            .as_ref()
            .map_or(Value::Empty, |f| Value::Text(f.to_string())),
    ]
}

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" \
Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" \
Target=\"xl/workbook.xml\"/></Relationships>";

// Style 0 is the default, style 1 the bold header.
const STYLES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\
<fonts count=\"2\"><font><sz val=\"11\"/><name val=\"Calibri\"/></font>\
<font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font></fonts>\
<fills count=\"2\"><fill><patternFill patternType=\"none\"/></fill>\
<fill><patternFill patternType=\"gray125\"/></fill></fills>\
<borders count=\"1\"><border><left/><right/><top/><bottom/><diagonal/></border></borders>\
<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\
<cellXfs count=\"2\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>\
<xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/></cellXfs>\
<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\
</styleSheet>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_letter(0), "A");
        assert_eq!(column_letter(25), "Z");
        assert_eq!(column_letter(26), "AA");
        assert_eq!(column_letter(27), "AB");
        assert_eq!(column_letter(701), "ZZ");
        assert_eq!(column_letter(702), "AAA");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape("1-2\u{1}\u{1f}"), "1-2\u{FFFD}\u{FFFD}");
        assert_eq!(escape("tab\there\r\n"), "tab\there\r\n");
    }

    #[test]
    fn test_sheet_xml() {
        let mut sheet = Sheet::new("T", vec!["a".into(), "b".into()], vec![10.0, 12.5]);
        sheet.push(vec![1.5.into(), "x<y".into()]);
        sheet.push(vec![Value::Empty, f64::NAN.into()]);
        let xml = sheet.to_xml();

        assert!(xml.contains("state=\"frozen\""));
        assert!(xml.contains("<col min=\"2\" max=\"2\" width=\"12.5\" customWidth=\"1\"/>"));
        assert!(xml.contains("<c r=\"A1\" t=\"inlineStr\" s=\"1\"><is><t>a</t></is></c>"));
        assert!(xml.contains("<c r=\"A2\"><v>1.5</v></c>"));
        assert!(xml.contains("<c r=\"B2\" t=\"inlineStr\"><is><t>x&lt;y</t></is></c>"));
        assert!(xml.contains("<row r=\"3\"></row>"));
    }
}
