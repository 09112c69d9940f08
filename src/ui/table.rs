use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::{COLUMNS, MunicipalDataset};
use crate::ui::map::group_thousands;

const ROW_HEIGHT: f32 = 18.0;
const MAX_TABLE_HEIGHT: f32 = 320.0;

/// Which dataset rows a table shows.
#[derive(Debug, Clone, Copy)]
pub enum Rows<'a> {
    All,
    Subset(&'a [usize]),
}

impl Rows<'_> {
    fn len(&self, dataset: &MunicipalDataset) -> usize {
        match self {
            Rows::All => dataset.len(),
            Rows::Subset(indices) => indices.len(),
        }
    }

    /// Dataset index of the `n`-th table row.
    fn index(&self, n: usize) -> Option<usize> {
        match self {
            Rows::All => Some(n),
            Rows::Subset(indices) => indices.get(n).copied(),
        }
    }
}

/// Collapsible table of the chosen rows.
pub fn data_table(ui: &mut Ui, title: &str, dataset: &MunicipalDataset, rows: Rows<'_>) {
    egui::CollapsingHeader::new(format!("{title} ({} rows)", rows.len(dataset)))
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.push_id(title, |ui: &mut Ui| {
                table(ui, dataset, rows);
            });
        });
}

fn table(ui: &mut Ui, dataset: &MunicipalDataset, rows: Rows<'_>) {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .max_scroll_height(MAX_TABLE_HEIGHT)
        .column(Column::auto().at_least(160.0))
        .columns(Column::auto(), COLUMNS.len() - 1)
        .header(ROW_HEIGHT + 2.0, |mut header| {
            for name in COLUMNS {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(dataset), |mut row| {
                let Some(r) = rows.index(row.index()).and_then(|i| dataset.record(i)) else {
                    return;
                };
                let cells = [
                    r.municipio.clone(),
                    r.estado.clone(),
                    r.regiao.clone(),
                    r.uf.clone(),
                    format!("{:.4}", r.latitude),
                    format!("{:.4}", r.longitude),
                    group_thousands(r.pop_21),
                ];
                for text in cells {
                    row.col(|ui: &mut Ui| {
                        ui.label(text);
                    });
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::record;

    fn dataset() -> MunicipalDataset {
        MunicipalDataset::from_records(vec![
            record("Palmas", "Tocantins", "Norte", "TO", 313_349),
            record("Belém", "Pará", "Norte", "PA", 1_506_420),
            record("Macapá", "Amapá", "Norte", "AP", 522_357),
        ])
    }

    #[test]
    fn all_rows_follow_dataset_order() {
        let ds = dataset();
        assert_eq!(Rows::All.len(&ds), 3);
        assert_eq!(Rows::All.index(2), Some(2));
        assert!(Rows::All.index(3).and_then(|i| ds.record(i)).is_none());
    }

    #[test]
    fn subset_maps_through_indices() {
        let ds = dataset();
        let rows = Rows::Subset(&[2, 0]);
        assert_eq!(rows.len(&ds), 2);
        let names: Vec<&str> = (0..rows.len(&ds))
            .filter_map(|n| rows.index(n).and_then(|i| ds.record(i)))
            .map(|r| r.municipio.as_str())
            .collect();
        assert_eq!(names, vec!["Macapá", "Palmas"]);
        assert_eq!(rows.index(2), None);
    }
}
