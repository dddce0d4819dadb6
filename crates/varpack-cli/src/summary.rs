use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Table};

use varpack::header::MAGIC;
use varpack::{ErrorKind, FileHeader, ProducerId};

use crate::commands::DemoValues;

/// Render demo values the way the demo prints them.
pub fn render_demo(values: &DemoValues) -> String {
    let mut out = String::new();
    if values.flag {
        out.push_str("The flag was set!\n");
    } else {
        out.push_str("The flag wasn't set.\n");
    }
    let ints: Vec<String> = values.ints.iter().map(ToString::to_string).collect();
    out.push_str("Ints:");
    if !ints.is_empty() {
        out.push(' ');
        out.push_str(&ints.join(", "));
    }
    out.push('\n');
    if let Some(text) = &values.text {
        out.push_str("Text: ");
        out.push_str(text);
        out.push('\n');
    }
    out
}

pub fn print_header(header: &FileHeader, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(header)?);
    } else {
        println!("{}", header_table(header));
    }
    Ok(())
}

pub fn header_table(header: &FileHeader) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Field"), header_cell("Value")]);
    apply_table_style(&mut table);

    let magic = if header.magic == MAGIC {
        format!("{:#010x}", header.magic)
    } else {
        format!("{:#010x} (swapped)", header.magic)
    };
    let producer = header
        .producer
        .as_ref()
        .map_or_else(|| "-".to_string(), producer_label);

    let rows = [
        ("Magic", magic),
        ("Byte order", header.endian.to_string()),
        ("Word width", format!("{} bytes", header.metadata.word_width)),
        ("Identifiers", header.metadata.id_mode.to_string()),
        ("Descriptions", yes_no(header.metadata.descriptions).to_string()),
        (
            "Format version",
            format!("{}.{}", header.format_version, header.format_subversion),
        ),
        ("Producer", producer),
        (
            "Producer version",
            format!("{}.{}", header.producer_version, header.producer_subversion),
        ),
        (
            "Producer description",
            header
                .producer_description
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    for (field, value) in rows {
        table.add_row(vec![Cell::new(field), Cell::new(value)]);
    }
    table
}

pub fn print_errors() {
    println!("{}", errors_table());
}

/// Outcome codes with their diagnostic names, success included.
pub fn errors_table() -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Code"), header_cell("Name")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);

    table.add_row(vec![Cell::new(0), Cell::new(varpack::strerror(0))]);
    for kind in ErrorKind::ALL {
        table.add_row(vec![Cell::new(kind.code()), Cell::new(kind.name())]);
    }
    table
}

fn producer_label(producer: &ProducerId) -> String {
    match producer {
        ProducerId::Name(name) => name.clone(),
        ProducerId::Numeric(id) => format!("{id:#010x}"),
    }
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label).add_attribute(Attribute::Bold)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_demo() {
        let values = DemoValues {
            flag: true,
            ints: vec![1, -2, 300],
            text: Some("hello".to_string()),
        };
        insta::assert_snapshot!(render_demo(&values), @r"
        The flag was set!
        Ints: 1, -2, 300
        Text: hello
        ");
    }

    #[test]
    fn test_render_demo_defaults() {
        insta::assert_snapshot!(render_demo(&DemoValues::default()), @r"
        The flag wasn't set.
        Ints:
        ");
    }

    #[test]
    fn test_errors_table_lists_every_code() {
        let rendered = errors_table().to_string();
        assert!(rendered.contains("OK"));
        for kind in ErrorKind::ALL {
            assert!(rendered.contains(kind.name()), "{kind} missing");
        }
    }
}
