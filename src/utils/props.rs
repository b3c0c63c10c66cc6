use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// A player prop line with a projected value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropLine {
    pub prop: String,
    pub line: f64,
    pub predicted: f64,
}

impl PropLine {
    /// Projection distance from the line, as a percentage of the line
    pub fn edge_percent(&self) -> Result<f64> {
        if !(self.line.is_finite() && self.line > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "prop line for {} must be positive, got {}",
                self.prop, self.line
            )));
        }
        Ok((self.predicted - self.line) / self.line * 100.0)
    }
}

/// A prop with its computed edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropEdge {
    pub prop: PropLine,
    pub edge: f64,
}

impl PropEdge {
    pub fn format(&self) -> String {
        format!(
            "{} | Line: {:.1} | Predicted: {:.1} | Edge: {:+.1}%",
            self.prop.prop, self.prop.line, self.prop.predicted, self.edge
        )
    }
}

/// Compute edges and sort them, largest first
pub fn rank_props(props: &[PropLine]) -> Result<Vec<PropEdge>> {
    let mut edges = props
        .iter()
        .map(|prop| {
            Ok(PropEdge {
                prop: prop.clone(),
                edge: prop.edge_percent()?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    edges.sort_by(|a, b| {
        b.edge
            .partial_cmp(&a.edge)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prop(name: &str, line: f64, predicted: f64) -> PropLine {
        PropLine {
            prop: name.to_string(),
            line,
            predicted,
        }
    }

    #[test]
    fn test_edge_percent() {
        let edge = prop("Points", 25.5, 27.1).edge_percent().unwrap();
        assert!((edge - 6.27).abs() < 0.01);

        let edge = prop("3PT Made", 2.5, 2.8).edge_percent().unwrap();
        assert!((edge - 12.0).abs() < 1e-9);

        assert!(prop("Broken", 0.0, 3.0).edge_percent().is_err());
    }

    #[test]
    fn test_rank_props() {
        let props = vec![
            prop("Points", 25.5, 27.1),
            prop("Assists", 6.5, 7.2),
            prop("Rebounds", 7.5, 8.1),
            prop("3PT Made", 2.5, 2.8),
            prop("PRA", 38.5, 40.5),
        ];
        let ranked = rank_props(&props).unwrap();
        let order: Vec<&str> = ranked.iter().map(|e| e.prop.prop.as_str()).collect();
        assert_eq!(order, vec!["3PT Made", "Assists", "Rebounds", "Points", "PRA"]);
    }
}
