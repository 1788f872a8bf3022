//! The enhancement selection record
//!
//! Built when the user picks an enhancement method, from the color set and
//! the bed list of the current processing result. Keeps the full color set
//! so a later re-selection against a different projection needs no network
//! round trip.

use bedflow_interfaces::{BedRecord, EnhancedColorSet, WorkflowError, WorkflowResult};

/// The chosen enhancement method and everything the clustering stage renders
#[derive(Debug, Clone, PartialEq)]
pub struct EnhancementSelection {
    /// Chosen method name
    pub method: String,

    /// The chosen method's rows, one per bed, used as plot coordinates
    pub plot_data: Vec<Vec<f64>>,

    /// Axis labels for the 2-D plot
    pub axis_labels: [String; 2],

    /// Per-bed display colors: the `original` method's rows when the
    /// backend provides them, otherwise each bed's raw median color
    pub original_colors: Vec<[f64; 3]>,

    /// The full color set the selection was made from
    pub color_set: EnhancedColorSet,
}

impl EnhancementSelection {
    /// Build a selection for `method` against the given color set and beds.
    ///
    /// Fails with `InvalidSelection` when `method` is not a key of the set;
    /// the caller is expected to have issued no network call in that case.
    pub fn build(
        method: &str,
        color_set: &EnhancedColorSet,
        beds: &[BedRecord],
    ) -> WorkflowResult<Self> {
        let rows = color_set.rows(method).ok_or_else(|| {
            WorkflowError::InvalidSelection(format!(
                "{} is not one of the available enhancement methods ({})",
                method,
                color_set.enhancement_methods.join(", ")
            ))
        })?;

        let original_colors = match color_set.rows("original") {
            Some(original_rows) => original_rows
                .iter()
                .map(|row| rgb_triple(row))
                .collect::<WorkflowResult<Vec<_>>>()?,
            // The backend omitted the original projection; fall back to the
            // raw bed medians so the clustering plot can still color beds.
            None => beds.iter().map(|bed| bed.rgb_median).collect(),
        };

        Ok(Self {
            method: method.to_string(),
            plot_data: rows.clone(),
            axis_labels: axis_labels_for(method),
            original_colors,
            color_set: color_set.clone(),
        })
    }
}

fn rgb_triple(row: &[f64]) -> WorkflowResult<[f64; 3]> {
    if row.len() < 3 {
        return Err(WorkflowError::MalformedResponse {
            service: "clustering".to_string(),
            detail: format!("original color row has {} components, need 3", row.len()),
        });
    }
    Ok([row[0], row[1], row[2]])
}

/// Plot axis labels for a method name. PCA projections get their
/// conventional component labels; everything else is the humanized method
/// name with an axis index.
fn axis_labels_for(method: &str) -> [String; 2] {
    if method.starts_with("pca") {
        return ["PC 1".to_string(), "PC 2".to_string()];
    }
    let pretty = method.replace('_', " ");
    [format!("{} 1", pretty), format!("{} 2", pretty)]
}
