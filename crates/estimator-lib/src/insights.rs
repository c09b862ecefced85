//! Risk observations drawn from a company's own history

use crate::models::{CompanyAnalysis, Field, ProjectInput};

/// Predicted cost above this multiple of the company average is "larger"
pub const LARGER_THAN_AVERAGE: f64 = 1.3;
/// Predicted cost below this multiple of the company average is "smaller"
pub const SMALLER_THAN_AVERAGE: f64 = 0.7;

/// Compare a prediction and its inputs against the company's track record
pub fn generate_insights(
    analysis: &CompanyAnalysis,
    input: &ProjectInput,
    predicted_cost: f64,
) -> Vec<String> {
    let mut insights = Vec::new();

    let avg_cost = analysis.avg_project_cost;
    let size = if predicted_cost > avg_cost * LARGER_THAN_AVERAGE {
        "This project is larger than your company's average"
    } else if predicted_cost < avg_cost * SMALLER_THAN_AVERAGE {
        "This project is smaller than your typical projects"
    } else {
        "Project size matches your company's typical projects"
    };
    insights.push(size.to_string());

    insights.push(format!(
        "Your company's historical success rate: {:.1}%",
        analysis.success_rate
    ));

    if let Some(avg_delays) = analysis.avg_delays {
        if input.number_or_zero(Field::Delays) > avg_delays {
            insights.push("Higher delays than your average - plan extra buffer time".to_string());
        }
    }
    if let Some(avg_rework) = analysis.avg_rework {
        if input.number_or_zero(Field::ReworkPercent) > avg_rework {
            insights.push("Higher rework risk than usual - strengthen quality control".to_string());
        }
    }

    insights
}
