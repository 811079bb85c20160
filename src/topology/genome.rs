//! Genome strings: `D n u₁ v₁ o₁… …` with 1-based vertices and
//! whitespace-separated integers. The parser also accepts the older
//! form without the vertex count; the two are distinguished by token
//! count modulo the edge width.

use super::labeling::Edge64;
use crate::io::{error::Error, Format};
use crate::model::graph::PeriodicGraph;

pub(crate) fn serialize(dim: usize, n: usize, edges: &[Edge64]) -> String {
    let mut out = format!("{} {}", dim, n);
    for &(u, v, o) in edges {
        out.push_str(&format!(" {} {}", u + 1, v + 1));
        for k in o.iter().take(dim) {
            out.push_str(&format!(" {}", k));
        }
    }
    out
}

/// Parses a genome string back into a periodic graph.
pub fn parse_genome(s: &str) -> Result<PeriodicGraph, Error> {
    let bad = |details: String| Error::parse(Format::Genome, 1, details);
    let tokens: Vec<i64> = s
        .split_whitespace()
        .map(|t| {
            t.parse::<i64>()
                .map_err(|_| bad(format!("'{}' is not an integer", t)))
        })
        .collect::<Result<_, _>>()?;
    let Some(&dim) = tokens.first() else {
        return Err(bad("empty genome".into()));
    };
    if !(1..=3).contains(&dim) {
        return Err(bad(format!("dimension {} out of range", dim)));
    }
    let dim = dim as usize;
    let width = dim + 2;
    let rem = tokens.len() - 1;
    let (explicit_n, start) = if rem == 0 {
        return Err(bad("genome has no edges".into()));
    } else if rem % width == 1 {
        (Some(tokens[1]), 2)
    } else if rem % width == 0 {
        (None, 1)
    } else {
        return Err(bad("token count does not match the edge width".into()));
    };

    let mut edges: Vec<(usize, usize, [i32; 3])> = Vec::new();
    let mut max_vertex = 0i64;
    for chunk in tokens[start..].chunks(width) {
        let (u, v) = (chunk[0], chunk[1]);
        if u < 1 || v < 1 {
            return Err(bad(format!("vertex indices are 1-based, got {} {}", u, v)));
        }
        max_vertex = max_vertex.max(u).max(v);
        let mut o = [0i32; 3];
        for (k, &c) in chunk[2..].iter().enumerate() {
            o[k] = i32::try_from(c)
                .map_err(|_| bad(format!("offset component {} out of range", c)))?;
        }
        edges.push((u as usize - 1, v as usize - 1, o));
    }
    let n = match explicit_n {
        Some(n) if n < max_vertex => {
            return Err(bad(format!(
                "vertex count {} is smaller than the largest index {}",
                n, max_vertex
            )));
        }
        Some(n) => n as usize,
        None => max_vertex as usize,
    };

    let mut g = PeriodicGraph::new(dim, n);
    for (u, v, o) in edges {
        if !g.add_edge(u, v, o) {
            return Err(bad(format!(
                "invalid edge {} {} {:?} (duplicate or zero self-loop)",
                u + 1,
                v + 1,
                &o[..dim]
            )));
        }
    }
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_emits_vertex_count() {
        let edges = vec![(0usize, 0usize, [0i64, 0, 1]), (0, 0, [0, 1, 0]), (0, 0, [1, 0, 0])];
        assert_eq!(
            serialize(3, 1, &edges),
            "3 1 1 1 0 0 1 1 1 0 1 0 1 1 1 0 0"
        );
    }

    #[test]
    fn parses_form_without_vertex_count() {
        let g = parse_genome("3   1 2  0 0 0   1 2  0 0 1   1 2  0 1 0   1 2  1 0 0").unwrap();
        assert_eq!(g.dim(), 3);
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn parses_form_with_vertex_count() {
        let g = parse_genome("3 2 1 2 0 0 0 1 2 0 0 1 1 2 0 1 0 1 2 1 0 0").unwrap();
        assert_eq!(g.vertex_count(), 2);
        assert_eq!(g.edge_count(), 4);
    }

    #[test]
    fn round_trips_through_serialize() {
        let s = "2 1 1 1 0 1 1 1 1 0";
        let g = parse_genome(s).unwrap();
        let edges: Vec<(usize, usize, [i64; 3])> = g
            .edges()
            .map(|e| {
                (
                    e.source,
                    e.target,
                    [
                        i64::from(e.offset[0]),
                        i64::from(e.offset[1]),
                        i64::from(e.offset[2]),
                    ],
                )
            })
            .collect();
        assert_eq!(serialize(g.dim(), g.vertex_count(), &edges), s);
    }

    #[test]
    fn rejects_malformed_genomes() {
        assert!(parse_genome("").is_err());
        assert!(parse_genome("4 1 2 0 0 0 0").is_err());
        assert!(parse_genome("3 1 2 0 0").is_err());
        assert!(parse_genome("3 x 2 0 0 0").is_err());
        assert!(parse_genome("3 1 1 0 0 0").is_err());
        assert!(parse_genome("3 1 1 2 0 0 0").is_err());
    }
}
