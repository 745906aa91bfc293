use serde::Serialize;

/// Element type of one typed run inside a buffer initializer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SegmentType {
    Byte,
    Float,
    Int,
    Uint,
}

impl SegmentType {
    pub fn element_width(&self) -> usize {
        match self {
            SegmentType::Byte => 1,
            SegmentType::Float | SegmentType::Int | SegmentType::Uint => 4,
        }
    }
}

/// One typed literal run from a buffer initializer, encoded little-endian
/// into an owned byte buffer at construction.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValuesSegment {
    element_type: SegmentType,
    data: Vec<u8>,
}

impl ValuesSegment {
    pub fn from_bytes(byte_data: &[u8]) -> Self {
        Self {
            element_type: SegmentType::Byte,
            data: byte_data.to_vec(),
        }
    }

    pub fn from_floats(float_data: &[f32]) -> Self {
        Self {
            element_type: SegmentType::Float,
            data: float_data.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    pub fn from_ints(int_data: &[i32]) -> Self {
        Self {
            element_type: SegmentType::Int,
            data: int_data.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    pub fn from_uints(uint_data: &[u32]) -> Self {
        Self {
            element_type: SegmentType::Uint,
            data: uint_data.iter().flat_map(|v| v.to_le_bytes()).collect(),
        }
    }

    pub fn element_type(&self) -> SegmentType {
        self.element_type
    }

    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// GLSL type of a uniform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ElementType {
    Float,
    Vec2,
    Vec3,
    Vec4,
    Int,
    Ivec2,
    Ivec3,
    Ivec4,
    Uint,
    Uvec2,
    Uvec3,
    Uvec4,
    Mat2x2,
    Mat2x3,
    Mat2x4,
    Mat3x2,
    Mat3x3,
    Mat3x4,
    Mat4x2,
    Mat4x3,
    Mat4x4,
    Sampler2d,
}

/// Scalar category of a uniform element type; decides which literal kinds
/// the value list accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScalarKind {
    Float,
    Int,
    Uint,
}

impl ElementType {
    /// Scalars per element, e.g. 3 for `vec3`, 6 for `mat2x3`.
    pub fn scalars_per_element(&self) -> usize {
        match self {
            ElementType::Float | ElementType::Int | ElementType::Uint | ElementType::Sampler2d => 1,
            ElementType::Vec2 | ElementType::Ivec2 | ElementType::Uvec2 => 2,
            ElementType::Vec3 | ElementType::Ivec3 | ElementType::Uvec3 => 3,
            ElementType::Vec4 | ElementType::Ivec4 | ElementType::Uvec4 | ElementType::Mat2x2 => 4,
            ElementType::Mat2x3 | ElementType::Mat3x2 => 6,
            ElementType::Mat2x4 | ElementType::Mat4x2 => 8,
            ElementType::Mat3x3 => 9,
            ElementType::Mat3x4 | ElementType::Mat4x3 => 12,
            ElementType::Mat4x4 => 16,
        }
    }

    pub fn scalar_kind(&self) -> ScalarKind {
        match self {
            ElementType::Int
            | ElementType::Ivec2
            | ElementType::Ivec3
            | ElementType::Ivec4
            | ElementType::Sampler2d => ScalarKind::Int,
            ElementType::Uint | ElementType::Uvec2 | ElementType::Uvec3 | ElementType::Uvec4 => {
                ScalarKind::Uint
            }
            _ => ScalarKind::Float,
        }
    }

    pub fn glsl_name(&self) -> &'static str {
        match self {
            ElementType::Float => "float",
            ElementType::Vec2 => "vec2",
            ElementType::Vec3 => "vec3",
            ElementType::Vec4 => "vec4",
            ElementType::Int => "int",
            ElementType::Ivec2 => "ivec2",
            ElementType::Ivec3 => "ivec3",
            ElementType::Ivec4 => "ivec4",
            ElementType::Uint => "uint",
            ElementType::Uvec2 => "uvec2",
            ElementType::Uvec3 => "uvec3",
            ElementType::Uvec4 => "uvec4",
            ElementType::Mat2x2 => "mat2x2",
            ElementType::Mat2x3 => "mat2x3",
            ElementType::Mat2x4 => "mat2x4",
            ElementType::Mat3x2 => "mat3x2",
            ElementType::Mat3x3 => "mat3x3",
            ElementType::Mat3x4 => "mat3x4",
            ElementType::Mat4x2 => "mat4x2",
            ElementType::Mat4x3 => "mat4x3",
            ElementType::Mat4x4 => "mat4x4",
            ElementType::Sampler2d => "sampler2D",
        }
    }
}

/// A uniform's type and payload. Values are encoded little-endian into an
/// owned byte buffer; the value count is validated once, here, against the
/// element type's arity and the optional array size.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UniformValue {
    element_type: ElementType,
    array_size: Option<usize>,
    data: Vec<u8>,
}

impl UniformValue {
    pub fn from_floats(
        element_type: ElementType,
        float_data: &[f32],
        array_size: Option<usize>,
    ) -> Result<Self, String> {
        check_count(element_type, float_data.len(), array_size)?;
        Ok(Self {
            element_type,
            array_size,
            data: float_data.iter().flat_map(|v| v.to_le_bytes()).collect(),
        })
    }

    pub fn from_ints(
        element_type: ElementType,
        int_data: &[i32],
        array_size: Option<usize>,
    ) -> Result<Self, String> {
        check_count(element_type, int_data.len(), array_size)?;
        Ok(Self {
            element_type,
            array_size,
            data: int_data.iter().flat_map(|v| v.to_le_bytes()).collect(),
        })
    }

    pub fn from_uints(
        element_type: ElementType,
        uint_data: &[u32],
        array_size: Option<usize>,
    ) -> Result<Self, String> {
        check_count(element_type, uint_data.len(), array_size)?;
        Ok(Self {
            element_type,
            array_size,
            data: uint_data.iter().flat_map(|v| v.to_le_bytes()).collect(),
        })
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn is_array(&self) -> bool {
        self.array_size.is_some()
    }

    pub fn array_size(&self) -> Option<usize> {
        self.array_size
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn float_values(&self) -> Vec<f32> {
        self.data
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    pub fn int_values(&self) -> Vec<i32> {
        self.data
            .chunks_exact(4)
            .map(|chunk| i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }

    pub fn uint_values(&self) -> Vec<u32> {
        self.data
            .chunks_exact(4)
            .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

fn check_count(
    element_type: ElementType,
    count: usize,
    array_size: Option<usize>,
) -> Result<(), String> {
    let expected = element_type.scalars_per_element() * array_size.unwrap_or(1);
    if count == expected {
        return Ok(());
    }
    match array_size {
        Some(size) => Err(format!(
            "Type '{}' with array size {} requires {} values, got {}",
            element_type.glsl_name(),
            size,
            expected,
            count
        )),
        None => Err(format!(
            "Type '{}' requires {} values, got {}",
            element_type.glsl_name(),
            expected,
            count
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{ElementType, UniformValue, ValuesSegment};

    #[test]
    fn segments_encode_little_endian() {
        let segment = ValuesSegment::from_ints(&[1, -1]);
        assert_eq!(segment.size_bytes(), 8);
        assert_eq!(segment.element_type().element_width(), 4);
        assert_eq!(&segment.data()[0..4], &[1, 0, 0, 0]);
        assert_eq!(&segment.data()[4..8], &[0xff, 0xff, 0xff, 0xff]);

        let segment = ValuesSegment::from_floats(&[1.0]);
        assert_eq!(segment.data(), 1.0_f32.to_le_bytes());

        let segment = ValuesSegment::from_bytes(&[9, 8, 7, 6]);
        assert_eq!(segment.size_bytes(), 4);
        assert_eq!(segment.element_type().element_width(), 1);

        let segment = ValuesSegment::from_uints(&[0xdead_beef]);
        assert_eq!(segment.data(), 0xdead_beef_u32.to_le_bytes());
    }

    #[test]
    fn uniform_count_must_match_arity() {
        assert!(UniformValue::from_floats(ElementType::Vec3, &[1.0, 2.0, 3.0], None).is_ok());
        let err = UniformValue::from_floats(ElementType::Vec3, &[1.0, 2.0], None).unwrap_err();
        assert_eq!(err, "Type 'vec3' requires 3 values, got 2");
    }

    #[test]
    fn uniform_array_count() {
        let value =
            UniformValue::from_ints(ElementType::Ivec2, &[1, 2, 3, 4, 5, 6], Some(3)).unwrap();
        assert!(value.is_array());
        assert_eq!(value.int_values(), vec![1, 2, 3, 4, 5, 6]);
        let err = UniformValue::from_ints(ElementType::Ivec2, &[1, 2, 3], Some(3)).unwrap_err();
        assert_eq!(err, "Type 'ivec2' with array size 3 requires 6 values, got 3");
    }

    #[test]
    fn matrix_arity() {
        assert_eq!(ElementType::Mat2x3.scalars_per_element(), 6);
        assert_eq!(ElementType::Mat4x4.scalars_per_element(), 16);
        assert!(UniformValue::from_floats(ElementType::Mat2x2, &[0.0; 4], None).is_ok());
    }

    #[test]
    fn uniform_values_round_trip() {
        let value = UniformValue::from_uints(ElementType::Uvec2, &[7, 9], None).unwrap();
        assert_eq!(value.uint_values(), vec![7, 9]);
        let value = UniformValue::from_floats(ElementType::Float, &[0.5], None).unwrap();
        assert_eq!(value.float_values(), vec![0.5]);
    }
}
