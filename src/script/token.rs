use core::fmt;

use serde::Serialize;

/// Lexical classification of a token. Command and parameter keywords are
/// upper case in the script grammar; type keywords are the lower-case GLSL
/// spellings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TokenType {
    // Command keywords
    AssertEqual,
    AssertPixels,
    AssertSimilarEmdHistogram,
    BindSampler,
    BindShaderStorageBuffer,
    BindTexture,
    BindUniformBuffer,
    CompileShader,
    CreateBuffer,
    CreateEmptyTexture2d,
    CreateProgram,
    CreateRenderbuffer,
    CreateSampler,
    DeclareShader,
    DumpBufferBinary,
    DumpBufferText,
    DumpRenderbuffer,
    RunCompute,
    RunGraphics,
    SetSamplerParameter,
    SetTextureParameter,
    SetUniform,

    // Parameter and value keywords
    Binding,
    Buffer,
    Buffers,
    Compute,
    Dimension,
    End,
    Expected,
    File,
    Format,
    Fragment,
    FramebufferAttachments,
    Gl,
    Gles,
    Height,
    IndexData,
    InitValues,
    Linear,
    Location,
    Name,
    Nearest,
    NumGroups,
    OffsetBytes,
    Parameter,
    Program,
    Rectangle,
    Renderbuffer,
    Renderbuffers,
    Sampler,
    Shader,
    Shaders,
    SizeBytes,
    SkipBytes,
    StrideBytes,
    Texture,
    TextureMagFilter,
    TextureMinFilter,
    TextureUnit,
    Tolerance,
    Topology,
    Triangles,
    Type,
    Value,
    Values,
    Vertex,
    VertexCount,
    VertexData,
    Width,

    // Type keywords
    TypeByte,
    TypeFloat,
    TypeInt,
    TypeIvec2,
    TypeIvec3,
    TypeIvec4,
    TypeMat2x2,
    TypeMat2x3,
    TypeMat2x4,
    TypeMat3x2,
    TypeMat3x3,
    TypeMat3x4,
    TypeMat4x2,
    TypeMat4x3,
    TypeMat4x4,
    TypeSampler2d,
    TypeUint,
    TypeUvec2,
    TypeUvec3,
    TypeUvec4,
    TypeVec2,
    TypeVec3,
    TypeVec4,

    // Literals and punctuation
    Identifier,
    IntLiteral,
    FloatLiteral,
    String,
    Arrow,
    Comma,
    SquareBracketOpen,
    SquareBracketClose,
    Eos,
    Unknown,
}

/// Keyword table sorted by spelling so that lookups can binary search.
pub const KEYWORDS: &[(&str, TokenType)] = &[
    ("ASSERT_EQUAL", TokenType::AssertEqual),
    ("ASSERT_PIXELS", TokenType::AssertPixels),
    ("ASSERT_SIMILAR_EMD_HISTOGRAM", TokenType::AssertSimilarEmdHistogram),
    ("BINDING", TokenType::Binding),
    ("BIND_SAMPLER", TokenType::BindSampler),
    ("BIND_SHADER_STORAGE_BUFFER", TokenType::BindShaderStorageBuffer),
    ("BIND_TEXTURE", TokenType::BindTexture),
    ("BIND_UNIFORM_BUFFER", TokenType::BindUniformBuffer),
    ("BUFFER", TokenType::Buffer),
    ("BUFFERS", TokenType::Buffers),
    ("COMPILE_SHADER", TokenType::CompileShader),
    ("COMPUTE", TokenType::Compute),
    ("CREATE_BUFFER", TokenType::CreateBuffer),
    ("CREATE_EMPTY_TEXTURE_2D", TokenType::CreateEmptyTexture2d),
    ("CREATE_PROGRAM", TokenType::CreateProgram),
    ("CREATE_RENDERBUFFER", TokenType::CreateRenderbuffer),
    ("CREATE_SAMPLER", TokenType::CreateSampler),
    ("DECLARE_SHADER", TokenType::DeclareShader),
    ("DIMENSION", TokenType::Dimension),
    ("DUMP_BUFFER_BINARY", TokenType::DumpBufferBinary),
    ("DUMP_BUFFER_TEXT", TokenType::DumpBufferText),
    ("DUMP_RENDERBUFFER", TokenType::DumpRenderbuffer),
    ("END", TokenType::End),
    ("EXPECTED", TokenType::Expected),
    ("FILE", TokenType::File),
    ("FORMAT", TokenType::Format),
    ("FRAGMENT", TokenType::Fragment),
    ("FRAMEBUFFER_ATTACHMENTS", TokenType::FramebufferAttachments),
    ("GL", TokenType::Gl),
    ("GLES", TokenType::Gles),
    ("HEIGHT", TokenType::Height),
    ("INDEX_DATA", TokenType::IndexData),
    ("INIT_VALUES", TokenType::InitValues),
    ("LINEAR", TokenType::Linear),
    ("LOCATION", TokenType::Location),
    ("NAME", TokenType::Name),
    ("NEAREST", TokenType::Nearest),
    ("NUM_GROUPS", TokenType::NumGroups),
    ("OFFSET_BYTES", TokenType::OffsetBytes),
    ("PARAMETER", TokenType::Parameter),
    ("PROGRAM", TokenType::Program),
    ("RECTANGLE", TokenType::Rectangle),
    ("RENDERBUFFER", TokenType::Renderbuffer),
    ("RENDERBUFFERS", TokenType::Renderbuffers),
    ("RUN_COMPUTE", TokenType::RunCompute),
    ("RUN_GRAPHICS", TokenType::RunGraphics),
    ("SAMPLER", TokenType::Sampler),
    ("SET_SAMPLER_PARAMETER", TokenType::SetSamplerParameter),
    ("SET_TEXTURE_PARAMETER", TokenType::SetTextureParameter),
    ("SET_UNIFORM", TokenType::SetUniform),
    ("SHADER", TokenType::Shader),
    ("SHADERS", TokenType::Shaders),
    ("SIZE_BYTES", TokenType::SizeBytes),
    ("SKIP_BYTES", TokenType::SkipBytes),
    ("STRIDE_BYTES", TokenType::StrideBytes),
    ("TEXTURE", TokenType::Texture),
    ("TEXTURE_MAG_FILTER", TokenType::TextureMagFilter),
    ("TEXTURE_MIN_FILTER", TokenType::TextureMinFilter),
    ("TEXTURE_UNIT", TokenType::TextureUnit),
    ("TOLERANCE", TokenType::Tolerance),
    ("TOPOLOGY", TokenType::Topology),
    ("TRIANGLES", TokenType::Triangles),
    ("TYPE", TokenType::Type),
    ("VALUE", TokenType::Value),
    ("VALUES", TokenType::Values),
    ("VERTEX", TokenType::Vertex),
    ("VERTEX_COUNT", TokenType::VertexCount),
    ("VERTEX_DATA", TokenType::VertexData),
    ("WIDTH", TokenType::Width),
    ("byte", TokenType::TypeByte),
    ("float", TokenType::TypeFloat),
    ("int", TokenType::TypeInt),
    ("ivec2", TokenType::TypeIvec2),
    ("ivec3", TokenType::TypeIvec3),
    ("ivec4", TokenType::TypeIvec4),
    ("mat2x2", TokenType::TypeMat2x2),
    ("mat2x3", TokenType::TypeMat2x3),
    ("mat2x4", TokenType::TypeMat2x4),
    ("mat3x2", TokenType::TypeMat3x2),
    ("mat3x3", TokenType::TypeMat3x3),
    ("mat3x4", TokenType::TypeMat3x4),
    ("mat4x2", TokenType::TypeMat4x2),
    ("mat4x3", TokenType::TypeMat4x3),
    ("mat4x4", TokenType::TypeMat4x4),
    ("sampler2D", TokenType::TypeSampler2d),
    ("uint", TokenType::TypeUint),
    ("uvec2", TokenType::TypeUvec2),
    ("uvec3", TokenType::TypeUvec3),
    ("uvec4", TokenType::TypeUvec4),
    ("vec2", TokenType::TypeVec2),
    ("vec3", TokenType::TypeVec3),
    ("vec4", TokenType::TypeVec4),
];

pub fn keyword_type(text: &str) -> Option<TokenType> {
    KEYWORDS
        .binary_search_by(|entry| entry.0.cmp(text))
        .ok()
        .map(|index| KEYWORDS[index].1)
}

/// Reverse of the keyword table. Only valid for keyword token types.
pub fn keyword_to_string(ttype: TokenType) -> &'static str {
    match ttype {
        TokenType::AssertEqual => "ASSERT_EQUAL",
        TokenType::AssertPixels => "ASSERT_PIXELS",
        TokenType::AssertSimilarEmdHistogram => "ASSERT_SIMILAR_EMD_HISTOGRAM",
        TokenType::Binding => "BINDING",
        TokenType::BindSampler => "BIND_SAMPLER",
        TokenType::BindShaderStorageBuffer => "BIND_SHADER_STORAGE_BUFFER",
        TokenType::BindTexture => "BIND_TEXTURE",
        TokenType::BindUniformBuffer => "BIND_UNIFORM_BUFFER",
        TokenType::Buffer => "BUFFER",
        TokenType::Buffers => "BUFFERS",
        TokenType::CompileShader => "COMPILE_SHADER",
        TokenType::Compute => "COMPUTE",
        TokenType::CreateBuffer => "CREATE_BUFFER",
        TokenType::CreateEmptyTexture2d => "CREATE_EMPTY_TEXTURE_2D",
        TokenType::CreateProgram => "CREATE_PROGRAM",
        TokenType::CreateRenderbuffer => "CREATE_RENDERBUFFER",
        TokenType::CreateSampler => "CREATE_SAMPLER",
        TokenType::DeclareShader => "DECLARE_SHADER",
        TokenType::Dimension => "DIMENSION",
        TokenType::DumpBufferBinary => "DUMP_BUFFER_BINARY",
        TokenType::DumpBufferText => "DUMP_BUFFER_TEXT",
        TokenType::DumpRenderbuffer => "DUMP_RENDERBUFFER",
        TokenType::End => "END",
        TokenType::Expected => "EXPECTED",
        TokenType::File => "FILE",
        TokenType::Format => "FORMAT",
        TokenType::Fragment => "FRAGMENT",
        TokenType::FramebufferAttachments => "FRAMEBUFFER_ATTACHMENTS",
        TokenType::Gl => "GL",
        TokenType::Gles => "GLES",
        TokenType::Height => "HEIGHT",
        TokenType::IndexData => "INDEX_DATA",
        TokenType::InitValues => "INIT_VALUES",
        TokenType::Linear => "LINEAR",
        TokenType::Location => "LOCATION",
        TokenType::Name => "NAME",
        TokenType::Nearest => "NEAREST",
        TokenType::NumGroups => "NUM_GROUPS",
        TokenType::OffsetBytes => "OFFSET_BYTES",
        TokenType::Parameter => "PARAMETER",
        TokenType::Program => "PROGRAM",
        TokenType::Rectangle => "RECTANGLE",
        TokenType::Renderbuffer => "RENDERBUFFER",
        TokenType::Renderbuffers => "RENDERBUFFERS",
        TokenType::RunCompute => "RUN_COMPUTE",
        TokenType::RunGraphics => "RUN_GRAPHICS",
        TokenType::Sampler => "SAMPLER",
        TokenType::SetSamplerParameter => "SET_SAMPLER_PARAMETER",
        TokenType::SetTextureParameter => "SET_TEXTURE_PARAMETER",
        TokenType::SetUniform => "SET_UNIFORM",
        TokenType::Shader => "SHADER",
        TokenType::Shaders => "SHADERS",
        TokenType::SizeBytes => "SIZE_BYTES",
        TokenType::SkipBytes => "SKIP_BYTES",
        TokenType::StrideBytes => "STRIDE_BYTES",
        TokenType::Texture => "TEXTURE",
        TokenType::TextureMagFilter => "TEXTURE_MAG_FILTER",
        TokenType::TextureMinFilter => "TEXTURE_MIN_FILTER",
        TokenType::TextureUnit => "TEXTURE_UNIT",
        TokenType::Tolerance => "TOLERANCE",
        TokenType::Topology => "TOPOLOGY",
        TokenType::Triangles => "TRIANGLES",
        TokenType::Type => "TYPE",
        TokenType::Value => "VALUE",
        TokenType::Values => "VALUES",
        TokenType::Vertex => "VERTEX",
        TokenType::VertexCount => "VERTEX_COUNT",
        TokenType::VertexData => "VERTEX_DATA",
        TokenType::Width => "WIDTH",
        TokenType::TypeByte => "byte",
        TokenType::TypeFloat => "float",
        TokenType::TypeInt => "int",
        TokenType::TypeIvec2 => "ivec2",
        TokenType::TypeIvec3 => "ivec3",
        TokenType::TypeIvec4 => "ivec4",
        TokenType::TypeMat2x2 => "mat2x2",
        TokenType::TypeMat2x3 => "mat2x3",
        TokenType::TypeMat2x4 => "mat2x4",
        TokenType::TypeMat3x2 => "mat3x2",
        TokenType::TypeMat3x3 => "mat3x3",
        TokenType::TypeMat3x4 => "mat3x4",
        TokenType::TypeMat4x2 => "mat4x2",
        TokenType::TypeMat4x3 => "mat4x3",
        TokenType::TypeMat4x4 => "mat4x4",
        TokenType::TypeSampler2d => "sampler2D",
        TokenType::TypeUint => "uint",
        TokenType::TypeUvec2 => "uvec2",
        TokenType::TypeUvec3 => "uvec3",
        TokenType::TypeUvec4 => "uvec4",
        TokenType::TypeVec2 => "vec2",
        TokenType::TypeVec3 => "vec3",
        TokenType::TypeVec4 => "vec4",
        TokenType::Identifier
        | TokenType::IntLiteral
        | TokenType::FloatLiteral
        | TokenType::String
        | TokenType::Arrow
        | TokenType::Comma
        | TokenType::SquareBracketOpen
        | TokenType::SquareBracketClose
        | TokenType::Eos
        | TokenType::Unknown => unreachable!("not a keyword token type"),
    }
}

/// 1-based source position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Location {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Token {
    pub ttype: TokenType,
    pub text: String,
    pub location: Location,
}

impl Token {
    pub fn new(ttype: TokenType, location: Location) -> Self {
        Self {
            ttype,
            text: String::new(),
            location,
        }
    }

    pub fn with_text(ttype: TokenType, location: Location, text: String) -> Self {
        Self {
            ttype,
            text,
            location,
        }
    }

    pub fn is_eos(&self) -> bool {
        self.ttype == TokenType::Eos
    }

    pub fn is_identifier(&self) -> bool {
        self.ttype == TokenType::Identifier
    }

    pub fn is_int_literal(&self) -> bool {
        self.ttype == TokenType::IntLiteral
    }

    pub fn is_float_literal(&self) -> bool {
        self.ttype == TokenType::FloatLiteral
    }

    pub fn is_string(&self) -> bool {
        self.ttype == TokenType::String
    }
}

#[cfg(test)]
mod tests {
    use super::{keyword_to_string, keyword_type, TokenType, KEYWORDS};

    #[test]
    fn keyword_table_is_sorted() {
        for pair in KEYWORDS.windows(2) {
            assert!(pair[0].0 < pair[1].0, "{} >= {}", pair[0].0, pair[1].0);
        }
    }

    #[test]
    fn keyword_round_trip() {
        for (text, ttype) in KEYWORDS {
            assert_eq!(keyword_type(text), Some(*ttype));
            assert_eq!(keyword_to_string(*ttype), *text);
        }
    }

    #[test]
    fn non_keywords_are_not_found() {
        assert_eq!(keyword_type("KIND"), None);
        assert_eq!(keyword_type("create_buffer"), None);
        assert_eq!(keyword_type(""), None);
        assert_eq!(keyword_type("vec5"), None);
    }

    #[test]
    fn case_matters() {
        assert_eq!(keyword_type("VEC2"), None);
        assert_eq!(keyword_type("sampler2d"), None);
        assert_eq!(keyword_type("sampler2D"), Some(TokenType::TypeSampler2d));
    }
}
