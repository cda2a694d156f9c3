//! Reader for DirectX `.x` model files in the text encoding.
//!
//! Only the first `Mesh` in the file is read, together with its
//! `MeshNormals`, `MeshTextureCoords` and `SkinWeights` children. Frame
//! transforms and animation sets are skipped. Binary and compressed `.x`
//! files are rejected.

use super::{BoneWeights, MeshData};
use std::collections::HashMap;

const HEADER_LEN: usize = 16;
const MAX_BONE_INFLUENCES: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum XFileError {
    #[error("not a .x file (missing `xof` header)")]
    BadHeader,
    #[error("unsupported .x encoding `{0}`, only text files can be read")]
    UnsupportedEncoding(String),
    #[error("unbalanced braces")]
    UnbalancedBraces,
    #[error("file contains no Mesh")]
    NoMesh,
    #[error("{0} ends early")]
    Truncated(&'static str),
    #[error("{what} index {index} out of range (only {count})")]
    IndexOutOfRange {
        what: &'static str,
        index: u32,
        count: usize,
    },
    #[error("MeshNormals faces do not match the mesh faces")]
    NormalFacesMismatch,
    #[error("expected {expected} texture coordinates, found {found}")]
    TexCoordCount { expected: usize, found: usize },
}

pub type Result<T> = std::result::Result<T, XFileError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Word(String),
    Text,
}

fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let mut word = String::new();

    fn flush(word: &mut String, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    }

    while let Some(c) = chars.next() {
        match c {
            '{' | '}' => {
                flush(&mut word, &mut tokens);
                tokens.push(if c == '{' { Token::Open } else { Token::Close });
            }
            '"' => {
                flush(&mut word, &mut tokens);
                for c in chars.by_ref() {
                    if c == '"' {
                        break;
                    }
                }
                tokens.push(Token::Text);
            }
            '<' => {
                // Template GUID.
                flush(&mut word, &mut tokens);
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                }
            }
            '#' => {
                flush(&mut word, &mut tokens);
                skip_line(&mut chars);
            }
            '/' if chars.peek() == Some(&'/') => {
                flush(&mut word, &mut tokens);
                skip_line(&mut chars);
            }
            ';' | ',' => flush(&mut word, &mut tokens),
            c if c.is_whitespace() => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

fn skip_line(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    for c in chars.by_ref() {
        if c == '\n' {
            break;
        }
    }
}

/// One `Kind [name] { ... }` block with its flattened values.
#[derive(Debug, Default)]
struct DataObject {
    kind: String,
    numbers: Vec<f64>,
    children: Vec<DataObject>,
}

impl DataObject {
    fn child(&self, kind: &str) -> Option<&DataObject> {
        self.children.iter().find(|child| child.kind == kind)
    }

    fn find(&self, kind: &str) -> Option<&DataObject> {
        if self.kind == kind {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(kind))
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.pos + ahead)
    }

    /// Parses values and nested blocks until the matching `}` (or the end of
    /// input at the top level).
    fn body(&mut self, into: &mut DataObject, nested: bool) -> Result<()> {
        while let Some(token) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;
            match token {
                Token::Close if nested => return Ok(()),
                Token::Close => return Err(XFileError::UnbalancedBraces),
                // Names such as bone labels are not needed.
                Token::Text => {}
                Token::Open => {
                    // `{ name }` reference to an object defined elsewhere.
                    let mut reference = DataObject::default();
                    self.body(&mut reference, true)?;
                }
                Token::Word(word) => {
                    if let Ok(number) = word.parse::<f64>() {
                        into.numbers.push(number);
                        continue;
                    }
                    let opens = match (self.peek(0), self.peek(1)) {
                        (Some(Token::Open), _) => Some(1),
                        (Some(Token::Word(_)), Some(Token::Open)) => Some(2),
                        _ => None,
                    };
                    // Bare words inside templates carry no data.
                    let Some(skip) = opens else { continue };
                    self.pos += skip;
                    let mut child = DataObject {
                        kind: word,
                        ..DataObject::default()
                    };
                    self.body(&mut child, true)?;
                    if child.kind != "template" {
                        into.children.push(child);
                    }
                }
            }
        }
        if nested {
            return Err(XFileError::UnbalancedBraces);
        }
        Ok(())
    }
}

/// Sequential reader over an object's numbers.
struct Values<'a> {
    numbers: &'a [f64],
    pos: usize,
    what: &'static str,
}

impl<'a> Values<'a> {
    fn new(object: &'a DataObject, what: &'static str) -> Self {
        Self {
            numbers: &object.numbers,
            pos: 0,
            what,
        }
    }

    fn number(&mut self) -> Result<f64> {
        let value = *self
            .numbers
            .get(self.pos)
            .ok_or(XFileError::Truncated(self.what))?;
        self.pos += 1;
        Ok(value)
    }

    fn float(&mut self) -> Result<f32> {
        Ok(self.number()? as f32)
    }

    fn count(&mut self) -> Result<usize> {
        let value = self.number()?;
        if value < 0.0 {
            return Err(XFileError::Truncated(self.what));
        }
        Ok(value as usize)
    }

    fn index(&mut self, count: usize) -> Result<u32> {
        let value = self.number()?;
        let index = value.max(0.0) as u32;
        if value < 0.0 || index as usize >= count {
            return Err(XFileError::IndexOutOfRange {
                what: self.what,
                index,
                count,
            });
        }
        Ok(index)
    }

    fn faces(&mut self, vertex_count: usize) -> Result<Vec<Vec<u32>>> {
        let face_count = self.count()?;
        let mut faces = Vec::with_capacity(face_count.min(1 << 20));
        for _ in 0..face_count {
            let corners = self.count()?;
            let face = (0..corners)
                .map(|_| self.index(vertex_count))
                .collect::<Result<Vec<_>>>()?;
            faces.push(face);
        }
        Ok(faces)
    }
}

/// Reads the first mesh of a text `.x` file.
pub fn parse_mesh(bytes: &[u8]) -> Result<MeshData> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != b"xof " {
        return Err(XFileError::BadHeader);
    }
    let encoding = String::from_utf8_lossy(&bytes[8..12]).into_owned();
    if encoding != "txt " {
        return Err(XFileError::UnsupportedEncoding(encoding.trim().to_string()));
    }

    let text = String::from_utf8_lossy(&bytes[HEADER_LEN..]);
    let mut parser = Parser {
        tokens: tokenize(&text),
        pos: 0,
    };
    let mut root = DataObject::default();
    parser.body(&mut root, false)?;
    let mesh = root.find("Mesh").ok_or(XFileError::NoMesh)?;
    build_mesh(mesh)
}

fn build_mesh(mesh: &DataObject) -> Result<MeshData> {
    let mut values = Values::new(mesh, "Mesh");
    let vertex_count = values.count()?;
    let positions = (0..vertex_count)
        .map(|_| Ok([values.float()?, values.float()?, values.float()?]))
        .collect::<Result<Vec<[f32; 3]>>>()?;
    let faces = values.faces(vertex_count)?;

    let normals = mesh
        .child("MeshNormals")
        .map(|normals| read_normals(normals, &faces))
        .transpose()?;
    let tex_coords = mesh
        .child("MeshTextureCoords")
        .map(|coords| read_tex_coords(coords, vertex_count))
        .transpose()?;
    let bones = read_skin_weights(mesh, vertex_count)?;

    // Corners become (position, normal) pairs so each output vertex carries a
    // single normal.
    let mut remap: HashMap<(u32, u32), u32> = HashMap::new();
    let mut source_vertex = Vec::new();
    let mut out = MeshData::default();
    for (face_index, face) in faces.iter().enumerate() {
        let mut corners = Vec::with_capacity(face.len());
        for (corner, &position) in face.iter().enumerate() {
            let normal = normals
                .as_ref()
                .map_or(u32::MAX, |(_, normal_faces)| normal_faces[face_index][corner]);
            let next = remap.len() as u32;
            let index = *remap.entry((position, normal)).or_insert_with(|| {
                source_vertex.push((position, normal));
                next
            });
            corners.push(index);
        }
        for i in 1..corners.len().saturating_sub(1) {
            out.indices
                .extend_from_slice(&[corners[0], corners[i], corners[i + 1]]);
        }
    }

    for &(position, normal) in &source_vertex {
        out.positions.push(positions[position as usize]);
        if let Some((list, _)) = &normals {
            out.normals.push(list[normal as usize]);
        }
        out.tex_coords.push(
            tex_coords
                .as_ref()
                .map_or([0.0, 0.0], |coords| coords[position as usize]),
        );
    }
    if normals.is_none() {
        out.normals = super::import::calculate_vertex_normals(&out.positions, &out.indices);
    }
    out.bones = bones.map(|per_vertex| {
        let mut weights = BoneWeights::default();
        for &(position, _) in &source_vertex {
            let (ids, w) = per_vertex[position as usize];
            weights.ids.push(ids);
            weights.weights.push(w);
        }
        weights
    });
    Ok(out)
}

type NormalData = (Vec<[f32; 3]>, Vec<Vec<u32>>);

fn read_normals(object: &DataObject, faces: &[Vec<u32>]) -> Result<NormalData> {
    let mut values = Values::new(object, "MeshNormals");
    let count = values.count()?;
    let normals = (0..count)
        .map(|_| Ok([values.float()?, values.float()?, values.float()?]))
        .collect::<Result<Vec<[f32; 3]>>>()?;
    let normal_faces = values.faces(count)?;
    let matches = normal_faces.len() == faces.len()
        && normal_faces
            .iter()
            .zip(faces)
            .all(|(normal, face)| normal.len() == face.len());
    if !matches {
        return Err(XFileError::NormalFacesMismatch);
    }
    Ok((normals, normal_faces))
}

fn read_tex_coords(object: &DataObject, vertex_count: usize) -> Result<Vec<[f32; 2]>> {
    let mut values = Values::new(object, "MeshTextureCoords");
    let count = values.count()?;
    if count != vertex_count {
        return Err(XFileError::TexCoordCount {
            expected: vertex_count,
            found: count,
        });
    }
    (0..count)
        .map(|_| Ok([values.float()?, values.float()?]))
        .collect()
}

/// Per-vertex bone ids and weights, strongest four influences kept.
fn read_skin_weights(
    mesh: &DataObject,
    vertex_count: usize,
) -> Result<Option<Vec<([i32; 4], [f32; 4])>>> {
    let mut influences: Vec<Vec<(i32, f32)>> = vec![Vec::new(); vertex_count];
    let mut any = false;
    let skins = mesh.children.iter().filter(|child| child.kind == "SkinWeights");
    for (bone, skin) in skins.enumerate() {
        any = true;
        let mut values = Values::new(skin, "SkinWeights");
        let count = values.count()?;
        let vertices = (0..count)
            .map(|_| values.index(vertex_count))
            .collect::<Result<Vec<_>>>()?;
        for vertex in vertices {
            let weight = values.float()?;
            influences[vertex as usize].push((bone as i32, weight));
        }
    }
    if !any {
        return Ok(None);
    }

    let packed = influences
        .into_iter()
        .map(|mut list| {
            list.sort_by(|a, b| b.1.total_cmp(&a.1));
            let mut ids = [0; MAX_BONE_INFLUENCES];
            let mut weights = [0.0; MAX_BONE_INFLUENCES];
            for (slot, (id, weight)) in list.into_iter().take(MAX_BONE_INFLUENCES).enumerate() {
                ids[slot] = id;
                weights[slot] = weight;
            }
            (ids, weights)
        })
        .collect();
    Ok(Some(packed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUAD_X: &str = r#"xof 0303txt 0032
template Vector {
 <3d82ab5e-62da-11cf-ab39-0020af71e433>
 FLOAT x;
 FLOAT y;
 FLOAT z;
}

// A unit quad with one bone pulling on the right edge.
Frame Root {
 FrameTransformMatrix {
  1.0,0.0,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,1.0;;
 }
 Mesh Quad {
  4;
  0.0;0.0;0.0;,
  1.0;0.0;0.0;,
  1.0;1.0;0.0;,
  0.0;1.0;0.0;;
  1;
  4;0,1,2,3;;
  MeshNormals {
   1;
   0.0;0.0;1.0;;
   1;
   4;0,0,0,0;;
  }
  MeshTextureCoords {
   4;
   0.0;1.0;,
   1.0;1.0;,
   1.0;0.0;,
   0.0;0.0;;
  }
  XSkinMeshHeader {
   1;
   2;
   1;
  }
  SkinWeights {
   "RightEdge";
   2;
   1,
   2;
   0.75,
   0.5;
   1.0,0.0,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,1.0,0.0,0.0,0.0,0.0,1.0;;
  }
 }
}
"#;

    #[test]
    fn reads_quad_as_two_triangles() {
        let mesh = parse_mesh(QUAD_X.as_bytes()).unwrap();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.positions[2], [1.0, 1.0, 0.0]);
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 4]);
        assert_eq!(mesh.tex_coords[3], [0.0, 0.0]);
    }

    #[test]
    fn skin_weights_become_bone_influences() {
        let mesh = parse_mesh(QUAD_X.as_bytes()).unwrap();
        let bones = mesh.bones.unwrap();
        assert_eq!(bones.weights.len(), 4);
        assert_eq!(bones.ids[1], [0, 0, 0, 0]);
        assert_eq!(bones.weights[1], [0.75, 0.0, 0.0, 0.0]);
        assert_eq!(bones.weights[2], [0.5, 0.0, 0.0, 0.0]);
        assert_eq!(bones.weights[0], [0.0; 4]);
    }

    #[test]
    fn missing_normals_are_computed() {
        let text = "xof 0303txt 0032\nMesh { 3; 0;0;0;, 1;0;0;, 0;1;0;; 1; 3;0,1,2;; }\n";
        let mesh = parse_mesh(text.as_bytes()).unwrap();
        assert_eq!(mesh.normals, vec![[0.0, 0.0, 1.0]; 3]);
        assert_eq!(mesh.tex_coords, vec![[0.0, 0.0]; 3]);
        assert!(mesh.bones.is_none());
    }

    #[test]
    fn binary_encoding_is_rejected() {
        let err = parse_mesh(b"xof 0303bin 0032\x00\x01").unwrap_err();
        assert!(matches!(err, XFileError::UnsupportedEncoding(ref e) if e == "bin"));
        assert!(matches!(
            parse_mesh(b"solid cube").unwrap_err(),
            XFileError::BadHeader
        ));
    }

    #[test]
    fn bad_face_index_is_reported() {
        let text = "xof 0303txt 0032\nMesh { 3; 0;0;0;, 1;0;0;, 0;1;0;; 1; 3;0,1,7;; }\n";
        let err = parse_mesh(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            XFileError::IndexOutOfRange {
                index: 7,
                count: 3,
                ..
            }
        ));
    }

    #[test]
    fn unclosed_block_is_rejected() {
        let text = "xof 0303txt 0032\nFrame { Mesh { 3;\n";
        assert!(matches!(
            parse_mesh(text.as_bytes()).unwrap_err(),
            XFileError::UnbalancedBraces
        ));
    }
}
