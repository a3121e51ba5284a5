use crate::explanation::types::{Assessment, Factor};
use crate::resolver::ResolutionMethod;

/// Markdown formatter for assessments
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Format assessment as markdown
    pub fn format(assessment: &Assessment) -> String {
        let mut md = String::with_capacity(1024);

        md.push_str(&format!(
            "# {} - {}\n\n",
            assessment.panchayat, assessment.risk_label
        ));
        md.push_str(&format!(
            "**Score:** {:.2}/100 ({})\n\n",
            assessment.score, assessment.level
        ));

        if let ResolutionMethod::NearestNeighbor { matched_location, distance_km, .. } = &assessment.resolution {
            md.push_str(&format!(
                "*Resolved to nearest Panchayat {} ({:.1} km away)*\n\n",
                matched_location, distance_km
            ));
        }

        md.push_str("## Contributing Factors\n\n");
        md.push_str("| Factor | Impact |\n|---|---|\n");
        let rows = [
            (Factor::Rainfall, "Rainfall", assessment.impacts.rainfall_impact),
            (Factor::Groundwater, "Groundwater", assessment.impacts.groundwater_impact),
            (Factor::LandUse, "Land use", assessment.impacts.landuse_impact),
        ];
        for (factor, label, impact) in rows {
            let marker = if factor == assessment.dominant_factor { " **(dominant)**" } else { "" };
            md.push_str(&format!("| {}{} | {:.2} |\n", label, marker, impact));
        }
        md.push('\n');

        md.push_str(&format!("{}\n\n", assessment.explanation));

        md.push_str("## Both Indicators\n\n");
        md.push_str(&format!(
            "- Flood: {:.2} ({})\n- Water scarcity: {:.2} ({})\n",
            assessment.flood_score, assessment.flood_level,
            assessment.scarcity_score, assessment.scarcity_level
        ));

        md
    }
}
