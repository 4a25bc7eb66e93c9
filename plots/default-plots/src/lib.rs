use common::plot::Plot;

/// Crate names of every plot library, for log filtering.
pub const PLOT_CRATES: &[&str] = &["common", "plot_common", "bst_csv", "bst_log", "os_sections"];

/// The full catalogue, in report order.
pub fn default_plots() -> Vec<Box<dyn Plot>> {
    vec![
        Box::new(bst_csv::BstHeights),
        Box::new(bst_csv::BstBuildTimes),
        Box::new(bst_csv::BstDeleteTimes),
        Box::new(bst_csv::InorderWalk),
        Box::new(bst_log::BstLog),
        Box::new(bst_csv::OsTreeComparison),
        Box::new(bst_csv::OsOperations),
        Box::new(os_sections::OsSections),
    ]
}

pub fn init_plots() {
    // Touch every plot type so its typetag registration is linked in.
    for plot in default_plots() {
        _ = serde_json::to_string(&plot);
    }
}
