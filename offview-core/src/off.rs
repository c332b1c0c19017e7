/// OFF mesh parser for the plain, colored and textured variants
///
/// The layout is line oriented:
///
/// ```text
/// OFF                 <- magic (COFF / STOFF for the variants)
/// 4 4 0               <- vertex count, face count, optional edge count
/// 0.0 0.0 0.0         <- one line per vertex
/// ...
/// 3 0 1 2             <- one line per face: arity, then 0-based indices
/// ```
///
/// Tokens are whitespace delimited. Every line must carry exactly the number
/// of tokens its role requires.
use std::path::Path;

use log::{debug, info};
use nalgebra::Vector3;
use nom::{
    bytes::complete::is_not,
    character::complete::{space0, space1, u32 as index},
    combinator::all_consuming,
    multi::separated_list0,
    number::complete::float,
    sequence::delimited,
    IResult,
};

use crate::error::{FormatError, FormatReason, Result};
use crate::geometry::{Face, Geometry, MeshFormat, Vertex};

/// Options applied while decoding vertex lines
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOptions {
    /// `STOFF` positions are divided by this before use
    pub unit_divisor: f32,
    /// Subtracted from `STOFF` positions after division
    pub center_offset: Vector3<f32>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            unit_divisor: 1000.0,
            center_offset: Vector3::zeros(),
        }
    }
}

/// Parse OFF text with default options
pub fn parse_off(input: &str) -> std::result::Result<Geometry, FormatError> {
    parse_off_with(input, &ParseOptions::default())
}

/// Parse OFF text. No partial geometry is returned on failure.
pub fn parse_off_with(
    input: &str,
    options: &ParseOptions,
) -> std::result::Result<Geometry, FormatError> {
    let mut lines = LineReader::new(input);

    let (line_no, header) = lines.next_line()?;
    let format = MeshFormat::from_magic(header.trim())
        .ok_or_else(|| FormatError::new(line_no, FormatReason::BadMagic))?;
    debug!("detected {} mesh", format.magic());

    let (line_no, counts) = lines.next_tokens()?;
    if counts.len() != 2 && counts.len() != 3 {
        return Err(FormatError::new(line_no, FormatReason::BadTokenCount));
    }
    let vertex_count = parse_index(counts[0], line_no)? as usize;
    let face_count = parse_index(counts[1], line_no)? as usize;

    // Counts are untrusted; never reserve more than the text could hold
    let line_budget = input.lines().count();
    let mut geometry = Geometry::with_capacity(
        format,
        vertex_count.min(line_budget),
        face_count.min(line_budget),
    );

    for _ in 0..vertex_count {
        let (line_no, tokens) = lines.next_tokens()?;
        geometry
            .vertices
            .push(parse_vertex(format, &tokens, line_no, options)?);
    }

    for _ in 0..face_count {
        let (line_no, tokens) = lines.next_tokens()?;
        geometry.faces.push(parse_face(&tokens, line_no)?);
    }

    lines.expect_end()?;

    Ok(geometry)
}

/// Read and parse a mesh file
pub fn load_geometry<P: AsRef<Path>>(path: P, options: &ParseOptions) -> Result<Geometry> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let geometry = parse_off_with(&text, options)?;
    info!(
        "loaded {} ({} vertices, {} faces)",
        path.display(),
        geometry.vertices.len(),
        geometry.faces.len()
    );
    Ok(geometry)
}

fn parse_vertex(
    format: MeshFormat,
    tokens: &[&str],
    line_no: usize,
    options: &ParseOptions,
) -> std::result::Result<Vertex, FormatError> {
    if tokens.len() != format.vertex_arity() {
        return Err(FormatError::new(line_no, FormatReason::BadTokenCount));
    }

    let values = tokens
        .iter()
        .map(|token| parse_float(token, line_no))
        .collect::<std::result::Result<Vec<f32>, _>>()?;

    let vertex = match format {
        MeshFormat::Plain => Vertex::new(values[0], values[1], values[2]),
        MeshFormat::Colored => Vertex::new(values[0], values[1], values[2])
            .with_color([values[3], values[4], values[5], values[6]]),
        MeshFormat::Textured => {
            let position = Vector3::new(values[0], values[1], values[2]) / options.unit_divisor
                - options.center_offset;
            if !position.iter().all(|c| c.is_finite()) {
                return Err(FormatError::new(line_no, FormatReason::NonFinite));
            }
            Vertex::new(position.x, position.y, position.z).with_tex_coord(values[3], values[4])
        }
    };

    Ok(vertex)
}

fn parse_face(tokens: &[&str], line_no: usize) -> std::result::Result<Face, FormatError> {
    let Some((arity, rest)) = tokens.split_first() else {
        return Err(FormatError::new(line_no, FormatReason::BadTokenCount));
    };

    let arity = parse_index(arity, line_no)? as usize;
    if rest.len() != arity {
        return Err(FormatError::new(line_no, FormatReason::BadTokenCount));
    }
    if arity < 3 {
        return Err(FormatError::new(line_no, FormatReason::FaceTooSmall));
    }

    let indices = rest
        .iter()
        .map(|token| parse_index(token, line_no))
        .collect::<std::result::Result<Vec<u32>, _>>()?;

    Ok(Face::new(indices))
}

fn split_tokens(input: &str) -> IResult<&str, Vec<&str>> {
    delimited(space0, separated_list0(space1, is_not(" \t")), space0)(input)
}

fn parse_float(token: &str, line_no: usize) -> std::result::Result<f32, FormatError> {
    let parsed: IResult<&str, f32> = all_consuming(float)(token);
    match parsed {
        Ok((_, value)) if value.is_finite() => Ok(value),
        Ok(_) => Err(FormatError::new(line_no, FormatReason::NonFinite)),
        Err(_) => Err(FormatError::new(line_no, FormatReason::BadNumber)),
    }
}

fn parse_index(token: &str, line_no: usize) -> std::result::Result<u32, FormatError> {
    let parsed: IResult<&str, u32> = all_consuming(index)(token);
    parsed
        .map(|(_, value)| value)
        .map_err(|_| FormatError::new(line_no, FormatReason::BadNumber))
}

/// Hands out lines together with their 1-based number
struct LineReader<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    last_line: usize,
}

impl<'a> LineReader<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines().enumerate(),
            last_line: 0,
        }
    }

    fn next_line(&mut self) -> std::result::Result<(usize, &'a str), FormatError> {
        match self.lines.next() {
            Some((idx, line)) => {
                self.last_line = idx + 1;
                Ok((idx + 1, line))
            }
            None => Err(FormatError::new(
                self.last_line + 1,
                FormatReason::UnexpectedEof,
            )),
        }
    }

    fn next_tokens(&mut self) -> std::result::Result<(usize, Vec<&'a str>), FormatError> {
        let (line_no, line) = self.next_line()?;
        match all_consuming(split_tokens)(line) {
            Ok((_, tokens)) => Ok((line_no, tokens)),
            Err(_) => Err(FormatError::new(line_no, FormatReason::BadTokenCount)),
        }
    }

    /// Only blank lines may follow the last face
    fn expect_end(&mut self) -> std::result::Result<(), FormatError> {
        for (idx, line) in self.lines.by_ref() {
            if !line.trim().is_empty() {
                return Err(FormatError::new(idx + 1, FormatReason::TrailingData));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TETRAHEDRON: &str = include_str!("../fixtures/tetrahedron.off");
    const QUAD: &str = include_str!("../fixtures/quad.stoff");

    fn reason(input: &str) -> FormatReason {
        parse_off(input).unwrap_err().reason
    }

    #[test]
    fn test_parse_tetrahedron_counts() {
        let geometry = parse_off(TETRAHEDRON).unwrap();
        assert_eq!(geometry.format, MeshFormat::Plain);
        assert_eq!(geometry.vertices.len(), 4);
        assert_eq!(geometry.faces.len(), 4);
        assert_eq!(geometry.triangle_indices().len(), 3 * 4);
        assert!(geometry.vertices.iter().all(|v| v.color.is_none()));
    }

    #[test]
    fn test_parse_textured_quad_scales_positions() {
        let geometry = parse_off(QUAD).unwrap();
        assert_eq!(geometry.format, MeshFormat::Textured);
        assert_eq!(geometry.faces.len(), 1);
        assert_eq!(geometry.triangle_indices(), vec![0, 1, 2, 0, 2, 3]);

        let corner = geometry.vertices[2];
        assert!((corner.position.x - 1.0).abs() < 1e-6);
        assert!((corner.position.y - 1.0).abs() < 1e-6);
        let uv = corner.tex_coord.unwrap();
        assert!((uv.x - 1.0).abs() < 1e-6 && (uv.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_textured_center_offset() {
        let options = ParseOptions {
            unit_divisor: 1000.0,
            center_offset: Vector3::new(0.5, 0.5, 0.0),
        };
        let geometry = parse_off_with(QUAD, &options).unwrap();
        let first = geometry.vertices[0].position;
        assert!((first.x + 0.5).abs() < 1e-6);
        assert!((first.y + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_parse_colored_vertices() {
        let input = "COFF\n3 1\n0 0 0 1 0 0 1\n1 0 0 0 1 0 1\n0 1 0 0 0 1 0.5\n3 0 1 2\n";
        let geometry = parse_off(input).unwrap();
        assert_eq!(geometry.format, MeshFormat::Colored);
        assert_eq!(geometry.vertices[2].color, Some([0.0, 0.0, 1.0, 0.5]));
    }

    #[test]
    fn test_edge_count_and_extra_spacing_accepted() {
        let input = "OFF\n3 1 3\n 0 0 0\n1\t0 0\n0  1 0 \n3 0 1 2\n\n";
        let geometry = parse_off(input).unwrap();
        assert_eq!(geometry.vertices.len(), 3);
    }

    #[test]
    fn test_bad_magic() {
        let err = parse_off("PLY\n0 0\n").unwrap_err();
        assert_eq!(err, FormatError::new(1, FormatReason::BadMagic));
    }

    #[test]
    fn test_vertex_line_with_missing_coordinate() {
        let err = parse_off("OFF\n3 1\n0 0 0\n1 0\n0 1 0\n3 0 1 2\n").unwrap_err();
        assert_eq!(err, FormatError::new(4, FormatReason::BadTokenCount));
    }

    #[test]
    fn test_face_line_arity_mismatch() {
        assert_eq!(
            reason("OFF\n3 1\n0 0 0\n1 0 0\n0 1 0\n3 0 1\n"),
            FormatReason::BadTokenCount
        );
        assert_eq!(
            reason("OFF\n3 1\n0 0 0\n1 0 0\n0 1 0\n2 0 1\n"),
            FormatReason::FaceTooSmall
        );
    }

    #[test]
    fn test_counts_line_token_count() {
        assert_eq!(reason("OFF\n3\n"), FormatReason::BadTokenCount);
        assert_eq!(reason("OFF\n3 1 3 9\n"), FormatReason::BadTokenCount);
    }

    #[test]
    fn test_non_numeric_and_non_finite_fields() {
        assert_eq!(
            reason("OFF\n1 0\n0 zero 0\n"),
            FormatReason::BadNumber
        );
        assert_eq!(reason("OFF\n1 0\n0 inf 0\n"), FormatReason::NonFinite);
        assert_eq!(reason("OFF\n-1 0\n"), FormatReason::BadNumber);
    }

    #[test]
    fn test_truncated_input() {
        let err = parse_off("OFF\n3 1\n0 0 0\n").unwrap_err();
        assert_eq!(err, FormatError::new(4, FormatReason::UnexpectedEof));
        assert_eq!(reason(""), FormatReason::UnexpectedEof);
    }

    #[test]
    fn test_huge_counts_with_short_body() {
        let err = parse_off("OFF\n4000000000 4000000000\n0 0 0\n").unwrap_err();
        assert_eq!(err, FormatError::new(4, FormatReason::UnexpectedEof));
    }

    #[test]
    fn test_textured_scaling_overflow_is_non_finite() {
        let options = ParseOptions {
            unit_divisor: 1e-30,
            ..Default::default()
        };
        let err = parse_off_with("STOFF\n1 0\n1e10 0 0 0 0\n", &options).unwrap_err();
        assert_eq!(err, FormatError::new(3, FormatReason::NonFinite));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_geometry("fixtures/does-not-exist.off", &ParseOptions::default())
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }

    #[test]
    fn test_trailing_data_rejected() {
        let err = parse_off("OFF\n3 1\n0 0 0\n1 0 0\n0 1 0\n3 0 1 2\n3 0 1 2\n").unwrap_err();
        assert_eq!(err, FormatError::new(7, FormatReason::TrailingData));
    }
}
