use std::ops::RangeFrom;

use toml_edit::{DocumentMut, Item, Table};

use crate::pipeline::types::{Param, PipelineConfig};

/// Write a resolved config back out as a TOML document.
///
/// `type` is only written when it differs from the section name, and each
/// section's dotted sub-sections follow it directly. Loading the output
/// yields a config equal to the input.
pub fn to_toml(config: &PipelineConfig) -> String {
    let mut doc = DocumentMut::new();
    let mut positions = 1..;

    for section in &config.sections {
        let mut table = header(&mut positions);
        if section.plugin.name() != section.name {
            table.insert("type", toml_edit::value(section.plugin.name()));
        }
        insert_params(&mut table, &section.params);

        for sub in &section.sub_sections {
            let Some(group) = table
                .entry(&sub.group)
                .or_insert_with(|| {
                    let mut implied = Table::new();
                    implied.set_implicit(true);
                    Item::Table(implied)
                })
                .as_table_mut()
            else {
                continue;
            };
            match &sub.name {
                Some(name) => {
                    let mut child = header(&mut positions);
                    insert_params(&mut child, &sub.params);
                    group.insert(name, Item::Table(child));
                }
                None => {
                    group.set_implicit(false);
                    group.set_position(positions.next().unwrap_or(usize::MAX));
                    insert_params(group, &sub.params);
                }
            }
        }

        doc.insert(&section.name, Item::Table(table));
    }

    doc.to_string()
}

/// An explicit `[header]` table printed at the next position.
fn header(positions: &mut RangeFrom<usize>) -> Table {
    let mut table = Table::new();
    table.set_position(positions.next().unwrap_or(usize::MAX));
    table
}

fn insert_params(table: &mut Table, params: &[Param]) {
    for param in params {
        table.insert(&param.key, Item::Value(param.value.to_toml()));
    }
}
