use std::collections::BTreeMap;

use serde::Serialize;

use super::token::Token;
use super::values::UniformValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ShaderKind {
    Vertex,
    Fragment,
    Compute,
}

impl ShaderKind {
    pub fn describe(&self) -> &'static str {
        match self {
            ShaderKind::Vertex => "vertex",
            ShaderKind::Fragment => "fragment",
            ShaderKind::Compute => "compute",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Topology {
    Triangles,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TextureParameter {
    MagFilter,
    MinFilter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TextureParameterValue {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum FormatEntryKind {
    Byte,
    Float,
    Int,
    Uint,
    Skip,
    Literal,
}

/// One entry of a `FORMAT` clause. For `Literal` the token is the string to
/// emit verbatim and the count is unused.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormatEntry {
    pub token: Token,
    pub kind: FormatEntryKind,
    pub count: u32,
}

/// One vertex attribute descriptor from a `VERTEX_DATA` list entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct VertexAttributeInfo {
    pub buffer_identifier: Token,
    pub offset_bytes: u32,
    pub stride_bytes: u32,
    pub dimension: u32,
}

/// How a `SET_UNIFORM` names its target uniform.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum UniformTarget {
    Location(u32),
    Name(Token),
}

/// One parsed instruction. Each variant carries its start token for
/// diagnostics plus the instruction's validated arguments; a command that
/// exists is syntactically sound, and only cross-command facts remain for
/// the checker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum Command {
    AssertEqual {
        start_token: Token,
        arguments_are_renderbuffers: bool,
        argument_identifier_1: Token,
        argument_identifier_2: Token,
        format_entries: Vec<FormatEntry>,
    },
    AssertPixels {
        start_token: Token,
        expected_r: u8,
        expected_g: u8,
        expected_b: u8,
        expected_a: u8,
        renderbuffer_identifier: Token,
        rectangle_x: u32,
        rectangle_y: u32,
        rectangle_width: u32,
        rectangle_height: u32,
        rectangle_width_token: Token,
        rectangle_height_token: Token,
    },
    AssertSimilarEmdHistogram {
        start_token: Token,
        renderbuffer_identifier_1: Token,
        renderbuffer_identifier_2: Token,
        tolerance: f32,
    },
    BindSampler {
        start_token: Token,
        sampler_identifier: Token,
        texture_unit: u32,
    },
    BindShaderStorageBuffer {
        start_token: Token,
        buffer_identifier: Token,
        binding: u32,
    },
    BindTexture {
        start_token: Token,
        texture_identifier: Token,
        texture_unit: u32,
    },
    BindUniformBuffer {
        start_token: Token,
        buffer_identifier: Token,
        binding: u32,
    },
    CompileShader {
        start_token: Token,
        result_identifier: Token,
        shader_identifier: Token,
    },
    CreateBuffer {
        start_token: Token,
        result_identifier: Token,
        size_bytes: u32,
        initial_data: Vec<u8>,
    },
    CreateEmptyTexture2d {
        start_token: Token,
        result_identifier: Token,
        width: u32,
        height: u32,
    },
    CreateProgram {
        start_token: Token,
        result_identifier: Token,
        compiled_shader_identifiers: Vec<Token>,
    },
    CreateRenderbuffer {
        start_token: Token,
        result_identifier: Token,
        width: u32,
        height: u32,
    },
    CreateSampler {
        start_token: Token,
        result_identifier: Token,
    },
    DeclareShader {
        start_token: Token,
        result_identifier: Token,
        kind: ShaderKind,
        shader_text: String,
        shader_start_line: u32,
    },
    DumpBufferBinary {
        start_token: Token,
        buffer_identifier: Token,
        filename: Token,
    },
    DumpBufferText {
        start_token: Token,
        buffer_identifier: Token,
        filename: Token,
        format_entries: Vec<FormatEntry>,
    },
    DumpRenderbuffer {
        start_token: Token,
        renderbuffer_identifier: Token,
        filename: Token,
    },
    RunCompute {
        start_token: Token,
        program_identifier: Token,
        num_groups_x: u32,
        num_groups_y: u32,
        num_groups_z: u32,
    },
    RunGraphics {
        start_token: Token,
        program_identifier: Token,
        vertex_data: BTreeMap<u32, VertexAttributeInfo>,
        index_data_buffer_identifier: Token,
        vertex_count: u32,
        topology: Topology,
        framebuffer_attachments: BTreeMap<u32, Token>,
    },
    SetSamplerParameter {
        start_token: Token,
        sampler_identifier: Token,
        parameter: TextureParameter,
        parameter_value: TextureParameterValue,
    },
    SetTextureParameter {
        start_token: Token,
        texture_identifier: Token,
        parameter: TextureParameter,
        parameter_value: TextureParameterValue,
    },
    SetUniform {
        start_token: Token,
        program_identifier: Token,
        target: UniformTarget,
        value: UniformValue,
    },
}

impl Command {
    pub fn start_token(&self) -> &Token {
        match self {
            Command::AssertEqual { start_token, .. }
            | Command::AssertPixels { start_token, .. }
            | Command::AssertSimilarEmdHistogram { start_token, .. }
            | Command::BindSampler { start_token, .. }
            | Command::BindShaderStorageBuffer { start_token, .. }
            | Command::BindTexture { start_token, .. }
            | Command::BindUniformBuffer { start_token, .. }
            | Command::CompileShader { start_token, .. }
            | Command::CreateBuffer { start_token, .. }
            | Command::CreateEmptyTexture2d { start_token, .. }
            | Command::CreateProgram { start_token, .. }
            | Command::CreateRenderbuffer { start_token, .. }
            | Command::CreateSampler { start_token, .. }
            | Command::DeclareShader { start_token, .. }
            | Command::DumpBufferBinary { start_token, .. }
            | Command::DumpBufferText { start_token, .. }
            | Command::DumpRenderbuffer { start_token, .. }
            | Command::RunCompute { start_token, .. }
            | Command::RunGraphics { start_token, .. }
            | Command::SetSamplerParameter { start_token, .. }
            | Command::SetTextureParameter { start_token, .. }
            | Command::SetUniform { start_token, .. } => start_token,
        }
    }

    /// The identifier a creating command binds, if this command binds one.
    pub fn result_identifier(&self) -> Option<&Token> {
        match self {
            Command::CompileShader {
                result_identifier, ..
            }
            | Command::CreateBuffer {
                result_identifier, ..
            }
            | Command::CreateEmptyTexture2d {
                result_identifier, ..
            }
            | Command::CreateProgram {
                result_identifier, ..
            }
            | Command::CreateRenderbuffer {
                result_identifier, ..
            }
            | Command::CreateSampler {
                result_identifier, ..
            }
            | Command::DeclareShader {
                result_identifier, ..
            } => Some(result_identifier),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::token::{Location, Token, TokenType};
    use super::Command;

    fn token(text: &str, line: u32, column: u32) -> Token {
        Token::with_text(TokenType::Identifier, Location { line, column }, text.to_string())
    }

    #[test]
    fn start_token_and_result_identifier() {
        let command = Command::CreateSampler {
            start_token: Token::with_text(
                TokenType::CreateSampler,
                Location { line: 4, column: 1 },
                "CREATE_SAMPLER".to_string(),
            ),
            result_identifier: token("my_sampler", 4, 16),
        };
        assert_eq!(command.start_token().location.line, 4);
        assert_eq!(command.result_identifier().unwrap().text, "my_sampler");

        let command = Command::BindSampler {
            start_token: Token::with_text(
                TokenType::BindSampler,
                Location { line: 5, column: 1 },
                "BIND_SAMPLER".to_string(),
            ),
            sampler_identifier: token("my_sampler", 5, 22),
            texture_unit: 0,
        };
        assert!(command.result_identifier().is_none());
    }
}
