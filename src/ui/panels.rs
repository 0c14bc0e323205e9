use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::state::AppState;
use crate::ui::plot;

const SUCCESS: Color32 = Color32::from_rgb(46, 160, 67);
const WARNING: Color32 = Color32::from_rgb(210, 153, 34);
const ERROR: Color32 = Color32::from_rgb(218, 54, 51);

fn success(ui: &mut Ui, text: &str) {
    ui.colored_label(SUCCESS, format!("✔ {text}"));
}

fn warning(ui: &mut Ui, text: &str) {
    ui.colored_label(WARNING, format!("⚠ {text}"));
}

fn error(ui: &mut Ui, text: &str) {
    ui.colored_label(ERROR, text);
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let (rows, cols) = ds.shape();
            let name = state.source_name.as_deref().unwrap_or("dataset");
            ui.label(format!("{name}: {rows} rows × {cols} columns"));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(ERROR));
        }
    });
}

// ---------------------------------------------------------------------------
// Dashboard sections (central panel)
// ---------------------------------------------------------------------------

/// Render every section top to bottom.
pub fn dashboard(ui: &mut Ui, state: &mut AppState) {
    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading(RichText::new("Lung Cancer Analysis Dashboard").size(28.0));
            ui.add_space(4.0);
            if ui.button("Upload Lung Cancer CSV file…").clicked() {
                open_file_dialog(state);
            }
            ui.add_space(8.0);

            if state.dataset.is_none() {
                warning(ui, "Please upload a CSV file to begin.");
                return;
            }

            success(ui, "Data loaded successfully!");
            overview(ui, state);
            exploration(ui, state);
            interactive_analysis(ui, state);
            correlation(ui, state);
            about(ui);
        });
}

fn overview(ui: &mut Ui, state: &mut AppState) {
    let Some(ds) = &state.dataset else {
        return;
    };
    let (rows, cols) = ds.shape();

    ui.add_space(12.0);
    ui.heading("Dataset Overview");
    ui.label(format!("Shape of dataset: ({rows}, {cols})"));
    if ds.is_empty() {
        warning(ui, "The file has a header but no rows.");
    }

    let mut show = state.show_raw_data;
    if ui.checkbox(&mut show, "Show raw data").changed() {
        state.toggle_raw_data();
    }
    if state.show_raw_data {
        ui.strong("Raw Data");
        raw_data_table(ui, state);
    }
}

fn raw_data_table(ui: &mut Ui, state: &AppState) {
    let Some(ds) = &state.dataset else {
        return;
    };
    let rows = ds.head(state.config.preview_rows);

    ScrollArea::horizontal()
        .id_salt("raw_data_scroll")
        .show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .vscroll(false)
                .columns(TableColumn::auto().at_least(60.0), ds.columns.len())
                .header(20.0, |mut header| {
                    for col in &ds.columns {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&col.name).on_hover_text(format!(
                                "{}, {} distinct",
                                col.kind,
                                col.distinct_count()
                            ));
                        });
                    }
                })
                .body(|mut body| {
                    for row in &rows {
                        body.row(18.0, |mut table_row| {
                            for cell in row {
                                table_row.col(|ui: &mut Ui| {
                                    ui.label(cell.to_string());
                                });
                            }
                        });
                    }
                });
        });
}

fn exploration(ui: &mut Ui, state: &AppState) {
    ui.add_space(12.0);
    ui.heading("Data Exploration");

    let label = &state.config.label_column;
    match &state.label_slices {
        Some(slices) => {
            ui.strong("Cancer Level Distribution");
            plot::pie_chart(ui, "level_pie", slices);
        }
        None => warning(ui, &format!("Column '{label}' not found in dataset.")),
    }

    ui.add_space(8.0);
    let age = &state.config.age_column;
    let has_age = state
        .dataset
        .as_ref()
        .is_some_and(|ds| ds.has_column(age));
    match &state.age_distribution {
        Some(dist) => {
            ui.strong("Age Distribution");
            plot::histogram(ui, "age_hist", dist);
        }
        None if has_age => warning(ui, &format!("Column '{age}' has no numeric values to plot.")),
        None => warning(ui, &format!("Column '{age}' not found in dataset.")),
    }
}

fn interactive_analysis(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(12.0);
    ui.heading("Interactive Analysis");

    if state.feature_options.is_empty() {
        warning(ui, "No suitable columns available for analysis.");
        return;
    }

    let options = state.feature_options.clone();
    let current = state.selected_feature.clone().unwrap_or_default();
    ui.label("Select a feature to analyze:");
    egui::ComboBox::from_id_salt("feature_select")
        .selected_text(&current)
        .width(240.0)
        .show_ui(ui, |ui: &mut Ui| {
            for col in &options {
                if ui.selectable_label(current == *col, col).clicked() && current != *col {
                    state.select_feature(col.clone());
                }
            }
        });

    if let Some(name) = &state.selected_feature {
        ui.strong(format!("Distribution of {name}"));
    }
    match &state.feature_counts {
        Some(Ok(counts)) => plot::count_plot(ui, "feature_counts", counts),
        Some(Err(e)) => error(ui, &format!("Could not create plot: {e}")),
        None => {}
    }
}

fn correlation(ui: &mut Ui, state: &mut AppState) {
    ui.add_space(12.0);
    if ui.button("Show Correlation Heatmap").clicked() {
        state.request_heatmap();
    }
    if let Some(msg) = &state.heatmap_warning {
        warning(ui, msg);
    }
    if let Some(matrix) = &state.heatmap {
        ui.strong("Correlation Heatmap");
        ScrollArea::horizontal()
            .id_salt("heatmap_scroll")
            .show(ui, |ui: &mut Ui| plot::heatmap(ui, matrix));
    }
}

fn about(ui: &mut Ui) {
    ui.add_space(16.0);
    ui.separator();
    ui.heading("About This Dashboard");
    ui.label("This interactive dashboard analyzes lung cancer patient data. Key features:");
    for item in [
        "Upload your own dataset",
        "View distribution of cancer levels",
        "Explore relationships between features",
        "Generate correlation heatmaps",
    ] {
        ui.label(format!("•  {item}"));
    }
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open lung cancer dataset")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} with shape {:?} and columns {:?}",
                    path.display(),
                    dataset.shape(),
                    dataset.column_names()
                );
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned());
                state.set_dataset(dataset, name);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                state.set_load_error(&e);
            }
        }
    }
}
