use crate::config::DashboardConfig;
use crate::data::model::{CellValue, Dataset};
use crate::data::stats::{
    proportions, value_counts, CategoryCounts, ChartError, CorrelationMatrix, Distribution,
};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Label distribution for the pie chart: `(label, count, share)`.
pub type LabelSlices = Vec<(String, usize, f64)>;

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    /// Loaded table (None until the user opens a file).
    pub dataset: Option<Dataset>,

    /// Display name of the loaded file.
    pub source_name: Option<String>,

    /// "Show raw data" checkbox.
    pub show_raw_data: bool,

    /// Pie slices for the label column, `None` when the column is missing.
    pub label_slices: Option<LabelSlices>,

    /// Age histogram, `None` when the column is missing or has no numbers.
    pub age_distribution: Option<Distribution>,

    /// Columns offered in the feature selector.
    pub feature_options: Vec<String>,

    pub selected_feature: Option<String>,

    /// Count plot of the selected feature, or why it could not be built.
    pub feature_counts: Option<Result<CategoryCounts, ChartError>>,

    /// Correlation matrix, present only while the heatmap is shown.
    pub heatmap: Option<CorrelationMatrix>,

    /// Shown in place of the heatmap when it cannot be drawn.
    pub heatmap_warning: Option<String>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            config,
            dataset: None,
            source_name: None,
            show_raw_data: false,
            label_slices: None,
            age_distribution: None,
            feature_options: Vec::new(),
            selected_feature: None,
            feature_counts: None,
            heatmap: None,
            heatmap_warning: None,
            status_message: None,
        }
    }

    /// Ingest a newly loaded table and derive every section from it.
    pub fn set_dataset(&mut self, dataset: Dataset, source_name: Option<String>) {
        self.label_slices = dataset.column(&self.config.label_column).map(|col| {
            let counts = value_counts(col);
            let shares = proportions(&counts);
            counts
                .into_iter()
                .zip(shares)
                .map(|((value, count), share): ((CellValue, usize), f64)| {
                    (value.to_string(), count, share)
                })
                .collect()
        });

        self.age_distribution = dataset
            .column(&self.config.age_column)
            .and_then(|col| Distribution::compute(col, self.config.histogram_bins));

        self.feature_options = dataset
            .columns
            .iter()
            .filter(|c| c.kind.is_feature() && !self.config.is_excluded(&c.name))
            .map(|c| c.name.clone())
            .collect();

        self.dataset = Some(dataset);
        self.source_name = source_name;
        self.show_raw_data = false;
        self.status_message = None;
        self.hide_heatmap();

        self.selected_feature = None;
        self.feature_counts = None;
        if let Some(first) = self.feature_options.first().cloned() {
            self.select_feature(first);
        }
    }

    /// Keep the current table and surface a load failure.
    pub fn set_load_error(&mut self, err: &anyhow::Error) {
        self.status_message = Some(format!("Error: {err:#}"));
    }

    /// Choose the feature whose distribution is shown.
    pub fn select_feature(&mut self, name: String) {
        self.hide_heatmap();
        let Some(ds) = &self.dataset else {
            return;
        };
        log::debug!("Selected feature '{name}'");
        let counts = CategoryCounts::for_feature(ds, &name, self.config.max_categories);
        if let Err(e) = &counts {
            log::warn!("Count plot for '{name}' unavailable: {e}");
        }
        self.feature_counts = Some(counts);
        self.selected_feature = Some(name);
    }

    pub fn toggle_raw_data(&mut self) {
        self.show_raw_data = !self.show_raw_data;
        self.hide_heatmap();
    }

    /// Compute the correlation matrix and show it until the next interaction.
    pub fn request_heatmap(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let matrix = CorrelationMatrix::compute(ds);
        log::debug!("Correlation over {} numeric columns", matrix.len());
        if matrix.len() < 2 {
            self.heatmap = None;
            self.heatmap_warning =
                Some("Need at least two numeric columns for a correlation heatmap.".to_string());
        } else {
            self.heatmap = Some(matrix);
            self.heatmap_warning = None;
        }
    }

    pub fn hide_heatmap(&mut self) {
        self.heatmap = None;
        self.heatmap_warning = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::read_csv;

    const LUNG_CSV: &str = "\
index,Patient Id,Age,Gender,Smoking,Alcohol use,Remission,Level
0,P1,33,1,3,4,true,Low
1,P10,17,1,2,1,false,Medium
2,P100,35,1,2,5,false,High
3,P1000,37,1,7,7,true,High
4,P101,46,1,8,8,false,High
";

    fn loaded(csv: &str) -> AppState {
        let mut state = AppState::default();
        state.set_dataset(read_csv(csv.as_bytes()).unwrap(), Some("test.csv".into()));
        state
    }

    #[test]
    fn sections_are_derived_on_load() {
        let state = loaded(LUNG_CSV);
        let slices = state.label_slices.as_ref().unwrap();
        assert_eq!(slices[0].0, "High");
        assert_eq!(slices[0].1, 3);
        assert!((slices[0].2 - 0.6).abs() < 1e-12);

        let age = state.age_distribution.as_ref().unwrap();
        assert_eq!(age.histogram.total(), 5);
        assert_eq!(age.histogram.counts.len(), 20);
    }

    #[test]
    fn feature_options_exclude_identifier_label_and_bool() {
        let state = loaded(LUNG_CSV);
        assert_eq!(
            state.feature_options,
            vec!["index", "Age", "Gender", "Smoking", "Alcohol use"]
        );
        assert_eq!(state.selected_feature.as_deref(), Some("index"));
        assert!(matches!(state.feature_counts, Some(Ok(_))));
    }

    #[test]
    fn selecting_a_feature_recomputes_counts() {
        let mut state = loaded(LUNG_CSV);
        state.select_feature("Smoking".into());
        let counts = state.feature_counts.clone().unwrap().unwrap();
        assert_eq!(counts.labels, vec!["2", "3", "7", "8"]);
        assert_eq!(counts.counts, vec![2, 1, 1, 1]);

        state.select_feature("Missing".into());
        assert!(matches!(
            state.feature_counts,
            Some(Err(ChartError::UnknownColumn(_)))
        ));
    }

    #[test]
    fn a_custom_label_column_is_not_offered_as_a_feature() {
        let config = DashboardConfig {
            label_column: "Stage".into(),
            ..DashboardConfig::default()
        };
        let mut state = AppState::new(config);
        let csv = "Patient Id,Age,Stage\nP1,30,I\nP2,40,II\nP3,50,I\n";
        state.set_dataset(read_csv(csv.as_bytes()).unwrap(), None);
        assert_eq!(state.feature_options, vec!["Age"]);
        assert_eq!(state.label_slices.as_ref().unwrap()[0].0, "I");
    }

    #[test]
    fn missing_special_columns_leave_sections_empty() {
        let state = loaded("Patient Id,Smoking\nP1,3\nP2,4\n");
        assert!(state.label_slices.is_none());
        assert!(state.age_distribution.is_none());
        assert_eq!(state.feature_options, vec!["Smoking"]);
    }

    #[test]
    fn heatmap_is_shown_until_the_next_interaction() {
        let mut state = loaded(LUNG_CSV);
        state.request_heatmap();
        let matrix = state.heatmap.as_ref().unwrap();
        assert_eq!(matrix.labels, vec!["index", "Age", "Gender", "Smoking", "Alcohol use"]);
        // Gender is constant.
        assert!(matrix.get(2, 2).is_nan());

        state.toggle_raw_data();
        assert!(state.show_raw_data);
        assert!(state.heatmap.is_none());

        state.request_heatmap();
        state.select_feature("Age".into());
        assert!(state.heatmap.is_none());
    }

    #[test]
    fn heatmap_needs_two_numeric_columns() {
        let mut state = loaded("Patient Id,Age,Level\nP1,30,Low\nP2,40,High\n");
        state.request_heatmap();
        assert!(state.heatmap.is_none());
        assert!(state.heatmap_warning.is_some());

        let mut empty = AppState::default();
        empty.request_heatmap();
        assert!(empty.heatmap.is_none() && empty.heatmap_warning.is_none());
    }

    #[test]
    fn load_error_keeps_the_previous_table() {
        let mut state = loaded(LUNG_CSV);
        state.set_load_error(&anyhow::anyhow!("bad file"));
        assert!(state.dataset.is_some());
        assert_eq!(state.status_message.as_deref(), Some("Error: bad file"));

        state.set_dataset(read_csv("a\n1\n".as_bytes()).unwrap(), None);
        assert!(state.status_message.is_none());
        assert_eq!(state.dataset.as_ref().unwrap().shape(), (1, 1));
    }
}
