// src/docx/reader.rs

// --- Imports ---
use crate::docx::models::DocumentElement;
use crate::utils::error::DocxError;
use roxmltree::Node;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

// --- Constants ---
const WORDML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
pub const DOCUMENT_PART: &str = "word/document.xml";

/// Opens a `.docx` file and returns its body elements in document order.
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentElement>, DocxError> {
    let path = path.as_ref();
    tracing::debug!("Opening document package {}", path.display());
    let file = File::open(path)?;
    read_document_from(BufReader::new(file))
}

/// Same as [`read_document`] for any seekable source (in-memory packages included).
pub fn read_document_from<R: Read + Seek>(source: R) -> Result<Vec<DocumentElement>, DocxError> {
    let mut archive = ZipArchive::new(source)?;

    let xml_content = {
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|e| match e {
            ZipError::FileNotFound => DocxError::MissingPart(DOCUMENT_PART.to_string()),
            other => DocxError::Zip(other),
        })?;
        let mut content = String::new();
        part.read_to_string(&mut content)?;
        content
    }; // part dropped here, releasing the archive borrow

    parse_body(&xml_content)
}

/// Parses `word/document.xml` and walks the direct children of `w:body`.
///
/// Only `w:p` and `w:tbl` become elements; section properties, content
/// controls and anything else at body level are skipped.
pub fn parse_body(xml_content: &str) -> Result<Vec<DocumentElement>, DocxError> {
    let doc = roxmltree::Document::parse(xml_content).map_err(|source| DocxError::Xml {
        part: DOCUMENT_PART.to_string(),
        source,
    })?;

    let body = doc
        .root_element()
        .children()
        .find(|n| is_w(n, "body"))
        .ok_or(DocxError::MissingBody)?;

    let mut elements = Vec::new();
    for child in body.children().filter(Node::is_element) {
        if is_w(&child, "p") {
            elements.push(DocumentElement::paragraph(paragraph_text(child)));
        } else if is_w(&child, "tbl") {
            elements.push(DocumentElement::Table {
                rows: table_rows(child),
            });
        } else {
            tracing::trace!("Skipping body element <{}>", child.tag_name().name());
        }
    }

    Ok(elements)
}

fn is_w(node: &Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(WORDML_NS)
        && node.tag_name().name() == name
}

fn w_child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| is_w(n, name))
}

fn w_val<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.attribute((WORDML_NS, "val"))
}

/// Visible text of a paragraph: runs directly under it and runs inside hyperlinks.
fn paragraph_text(paragraph: Node) -> String {
    let mut text = String::new();
    for child in paragraph.children() {
        if is_w(&child, "r") {
            push_run_text(child, &mut text);
        } else if is_w(&child, "hyperlink") {
            for run in child.children().filter(|n| is_w(n, "r")) {
                push_run_text(run, &mut text);
            }
        }
    }
    text
}

fn push_run_text(run: Node, out: &mut String) {
    for child in run.children().filter(Node::is_element) {
        if !child.tag_name().namespace().is_some_and(|ns| ns == WORDML_NS) {
            continue;
        }
        match child.tag_name().name() {
            "t" => out.push_str(child.text().unwrap_or_default()),
            "tab" => out.push('\t'),
            // page and column breaks carry no text
            "br" => {
                if matches!(child.attribute((WORDML_NS, "type")), None | Some("textWrapping")) {
                    out.push('\n');
                }
            }
            "cr" => out.push('\n'),
            "noBreakHyphen" => out.push('-'),
            _ => {}
        }
    }
}

/// Cell text is the cell's own paragraphs joined by newlines; nested tables are ignored.
fn cell_text(cell: Node) -> String {
    cell.children()
        .filter(|n| is_w(n, "p"))
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Expands a `w:tbl` into layout-grid rows.
///
/// `w:gridSpan` repeats a cell across the columns it covers, and a
/// continuing `w:vMerge` cell repeats the text of the cell above it.
/// Grid columns skipped by `w:gridBefore` produce no cells but still
/// count when lining a merged cell up with the row above.
fn table_rows(table: Node) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = Vec::new();
    // grid column -> text, for the previous row
    let mut above: HashMap<usize, String> = HashMap::new();

    for tr in table.children().filter(|n| is_w(n, "tr")) {
        let mut row: Vec<String> = Vec::new();
        let mut current: HashMap<usize, String> = HashMap::new();

        let mut column = w_child(tr, "trPr")
            .and_then(|p| w_child(p, "gridBefore"))
            .and_then(w_val)
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        for tc in tr.children().filter(|n| is_w(n, "tc")) {
            let props = w_child(tc, "tcPr");

            let span = props
                .and_then(|p| w_child(p, "gridSpan"))
                .and_then(w_val)
                .and_then(|v| v.parse::<usize>().ok())
                .filter(|&s| s > 0)
                .unwrap_or(1);

            let continues_merge = props
                .and_then(|p| w_child(p, "vMerge"))
                .is_some_and(|m| w_val(m) != Some("restart"));

            let text = if continues_merge {
                tracing::trace!("Vertically merged cell at grid column {}", column);
                above.get(&column).cloned().unwrap_or_default()
            } else {
                cell_text(tc)
            };

            if span > 1 {
                tracing::trace!("Cell spans {} grid columns", span);
            }
            for offset in 0..span {
                current.insert(column + offset, text.clone());
            }
            row.extend(std::iter::repeat(text).take(span));
            column += span;
        }

        rows.push(row);
        above = current;
    }

    rows
}

// --- Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::docx::fixtures::{docx_bytes, document_xml, paragraph, table};
    use std::io::Cursor;

    #[test]
    fn test_body_order_is_preserved() {
        let body = format!(
            "{}{}{}",
            paragraph("Table 1: Revenue"),
            table(&[&["Region", "Revenue"], &["Cairo", "100"]]),
            paragraph("After"),
        );
        let elements = read_document_from(Cursor::new(docx_bytes(&body))).unwrap();

        assert_eq!(
            elements,
            vec![
                DocumentElement::paragraph("Table 1: Revenue"),
                DocumentElement::table([["Region", "Revenue"], ["Cairo", "100"]]),
                DocumentElement::paragraph("After"),
            ]
        );
    }

    #[test]
    fn test_run_text_semantics() {
        let body = r#"<w:p>
            <w:r><w:t xml:space="preserve">Table </w:t></w:r>
            <w:hyperlink r:id="rId4"><w:r><w:t>2</w:t></w:r></w:hyperlink>
            <w:r><w:t>:</w:t><w:tab/><w:t>A</w:t><w:br/><w:t>B</w:t><w:noBreakHyphen/><w:delText>gone</w:delText></w:r>
        </w:p>"#;
        let elements = parse_body(&document_xml(body)).unwrap();

        assert_eq!(elements, vec![DocumentElement::paragraph("Table 2:\tA\nB-")]);
    }

    #[test]
    fn test_cells_are_trimmed_and_joined() {
        let body = r#"<w:tbl><w:tr><w:tc>
            <w:p><w:r><w:t xml:space="preserve">  first  </w:t></w:r></w:p>
            <w:p><w:r><w:t>second</w:t></w:r></w:p>
        </w:tc></w:tr></w:tbl>"#;
        let elements = parse_body(&document_xml(body)).unwrap();

        assert_eq!(elements, vec![DocumentElement::table([["first  \nsecond"]])]);
    }

    #[test]
    fn test_merged_cells_follow_layout_grid() {
        let body = r#"<w:tbl>
            <w:tr>
                <w:tc><w:tcPr><w:gridSpan w:val="2"/></w:tcPr><w:p><w:r><w:t>Wide</w:t></w:r></w:p></w:tc>
                <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>Tall</w:t></w:r></w:p></w:tc>
            </w:tr>
            <w:tr>
                <w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc>
                <w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc>
                <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
            </w:tr>
        </w:tbl>"#;
        let elements = parse_body(&document_xml(body)).unwrap();

        assert_eq!(
            elements,
            vec![DocumentElement::table([
                ["Wide", "Wide", "Tall"],
                ["a", "b", "Tall"],
            ])]
        );
    }

    #[test]
    fn test_page_and_column_breaks_add_no_text() {
        let body = r#"<w:tbl><w:tr><w:tc><w:p><w:r>
            <w:t>A</w:t><w:br w:type="page"/><w:t>B</w:t><w:br w:type="column"/><w:t>C</w:t>
            <w:br w:type="textWrapping"/><w:t>D</w:t>
        </w:r></w:p></w:tc></w:tr></w:tbl>"#;
        let elements = parse_body(&document_xml(body)).unwrap();

        assert_eq!(elements, vec![DocumentElement::table([["ABC\nD"]])]);
    }

    #[test]
    fn test_vertical_merge_respects_grid_before() {
        let body = r#"<w:tbl>
            <w:tr>
                <w:tc><w:p><w:r><w:t>left</w:t></w:r></w:p></w:tc>
                <w:tc><w:tcPr><w:vMerge w:val="restart"/></w:tcPr><w:p><w:r><w:t>right</w:t></w:r></w:p></w:tc>
            </w:tr>
            <w:tr>
                <w:trPr><w:gridBefore w:val="1"/></w:trPr>
                <w:tc><w:tcPr><w:vMerge/></w:tcPr><w:p/></w:tc>
            </w:tr>
        </w:tbl>"#;
        let elements = parse_body(&document_xml(body)).unwrap();

        assert_eq!(
            elements,
            vec![DocumentElement::table(vec![vec!["left", "right"], vec!["right"]])]
        );
    }

    #[test]
    fn test_non_block_body_children_are_skipped() {
        let body = format!(
            "{}<w:sectPr><w:pgSz w:w=\"12240\"/></w:sectPr>",
            paragraph("only")
        );
        let elements = parse_body(&document_xml(&body)).unwrap();
        assert_eq!(elements, vec![DocumentElement::paragraph("only")]);
    }

    #[test]
    fn test_missing_document_part() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = read_document_from(Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, DocxError::MissingPart(ref part) if part == DOCUMENT_PART));
    }

    #[test]
    fn test_not_a_zip() {
        let err = read_document_from(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, DocxError::Zip(_)));
    }

    #[test]
    fn test_malformed_xml() {
        let err = parse_body("<w:document><w:body>").unwrap_err();
        assert!(matches!(err, DocxError::Xml { .. }));
    }
}
