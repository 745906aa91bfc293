use std::collections::{HashMap, HashSet};

use super::api_version::{Api, ApiVersion};
use super::command::{
    Command, FormatEntry, FormatEntryKind, ShaderKind, TextureParameter, TextureParameterValue,
    Topology, UniformTarget, VertexAttributeInfo,
};
use super::message::MessageLog;
use super::program::Program;
use super::token::{keyword_to_string, Token, TokenType};
use super::tokenizer::Tokenizer;
use super::values::{ElementType, ScalarKind, UniformValue, ValuesSegment};

/// Failure detail lives in the message log; the Err side only signals it.
type ParseResult<T> = Result<T, ()>;

/// Recursive-descent parser over the token stream. One sub-parser per
/// command keyword; the first failure anywhere aborts the whole parse.
pub struct Parser<'a> {
    tokenizer: Tokenizer,
    messages: &'a mut MessageLog,
    parsed_commands: Vec<Command>,
}

impl<'a> Parser<'a> {
    pub fn new(input: &str, messages: &'a mut MessageLog) -> Self {
        Self {
            tokenizer: Tokenizer::new(input),
            messages,
            parsed_commands: vec![],
        }
    }

    pub fn parse(mut self) -> Result<Program, ()> {
        let api_version = self.parse_api_version()?;
        while !self.tokenizer.peek_next_token(true).is_eos() {
            self.parse_command()?;
        }
        Ok(Program::new(api_version, self.parsed_commands))
    }

    // The version header is optional; a script that opens with a command
    // keyword targets GLES 3.2.
    fn parse_api_version(&mut self) -> ParseResult<ApiVersion> {
        let api = match self.tokenizer.peek_next_token(true).ttype {
            TokenType::Gl => Api::Gl,
            TokenType::Gles => Api::Gles,
            _ => return Ok(ApiVersion::new(Api::Gles, 3, 2)),
        };
        let api_token = self.tokenizer.next_token(true);
        let major_minor = self.tokenizer.next_token(true);
        if !major_minor.is_float_literal() {
            self.messages.error(
                Some(&api_token),
                format!(
                    "Expected major and minor versions in the form 'MAJOR.MINOR'; found '{}'",
                    major_minor.text
                ),
            );
            return Err(());
        }
        let (major, minor) = match (api, major_minor.text.as_str()) {
            (Api::Gl, "4.0") => (4, 0),
            (Api::Gl, "4.1") => (4, 1),
            (Api::Gl, "4.2") => (4, 2),
            (Api::Gl, "4.3") => (4, 3),
            (Api::Gl, "4.4") => (4, 4),
            (Api::Gl, "4.5") => (4, 5),
            (Api::Gl, "4.6") => (4, 6),
            (Api::Gles, "2.0") => (2, 0),
            (Api::Gles, "3.0") => (3, 0),
            (Api::Gles, "3.1") => (3, 1),
            (Api::Gles, "3.2") => (3, 2),
            (Api::Gl, _) => {
                self.messages.error(
                    Some(&api_token),
                    format!("Unsupported OpenGL version: {}", major_minor.text),
                );
                return Err(());
            }
            (Api::Gles, _) => {
                self.messages.error(
                    Some(&api_token),
                    format!("Unsupported OpenGL ES version: {}", major_minor.text),
                );
                return Err(());
            }
        };
        Ok(ApiVersion::new(api, major, minor))
    }

    fn parse_command(&mut self) -> ParseResult<()> {
        let token = self.tokenizer.peek_next_token(true);
        match token.ttype {
            TokenType::AssertEqual => self.parse_command_assert_equal(),
            TokenType::AssertPixels => self.parse_command_assert_pixels(),
            TokenType::AssertSimilarEmdHistogram => {
                self.parse_command_assert_similar_emd_histogram()
            }
            TokenType::BindSampler => self.parse_command_bind_sampler(),
            TokenType::BindShaderStorageBuffer => self.parse_command_bind_shader_storage_buffer(),
            TokenType::BindTexture => self.parse_command_bind_texture(),
            TokenType::BindUniformBuffer => self.parse_command_bind_uniform_buffer(),
            TokenType::CompileShader => self.parse_command_compile_shader(),
            TokenType::CreateBuffer => self.parse_command_create_buffer(),
            TokenType::CreateEmptyTexture2d => self.parse_command_create_empty_texture_2d(),
            TokenType::CreateProgram => self.parse_command_create_program(),
            TokenType::CreateRenderbuffer => self.parse_command_create_renderbuffer(),
            TokenType::CreateSampler => self.parse_command_create_sampler(),
            TokenType::DeclareShader => self.parse_command_declare_shader(),
            TokenType::DumpBufferBinary => self.parse_command_dump_buffer_binary(),
            TokenType::DumpBufferText => self.parse_command_dump_buffer_text(),
            TokenType::DumpRenderbuffer => self.parse_command_dump_renderbuffer(),
            TokenType::RunCompute => self.parse_command_run_compute(),
            TokenType::RunGraphics => self.parse_command_run_graphics(),
            TokenType::SetSamplerParameter => self.parse_command_set_sampler_parameter(),
            TokenType::SetTextureParameter => self.parse_command_set_texture_parameter(),
            TokenType::SetUniform => self.parse_command_set_uniform(),
            _ => {
                self.messages
                    .error(Some(&token), format!("Unknown command: '{}'", token.text));
                Err(())
            }
        }
    }

    fn parse_command_assert_equal(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut arguments_are_renderbuffers = false;
        let mut argument_identifier_1 = None;
        let mut argument_identifier_2 = None;
        let mut format_entries = vec![];
        self.parse_parameters(
            &[
                TokenType::Buffers,
                TokenType::Renderbuffers,
                TokenType::Format,
            ],
            &[(TokenType::Buffers, TokenType::Renderbuffers)],
            &[TokenType::Format],
            |parser, key| match key {
                TokenType::Buffers => {
                    arguments_are_renderbuffers = false;
                    argument_identifier_1 =
                        Some(parser.expect_identifier("identifier for first buffer to be compared")?);
                    argument_identifier_2 = Some(
                        parser.expect_identifier("identifier for second buffer to be compared")?,
                    );
                    Ok(())
                }
                TokenType::Renderbuffers => {
                    arguments_are_renderbuffers = true;
                    argument_identifier_1 = Some(
                        parser
                            .expect_identifier("identifier for first renderbuffer to be compared")?,
                    );
                    argument_identifier_2 = Some(
                        parser
                            .expect_identifier("identifier for second renderbuffer to be compared")?,
                    );
                    Ok(())
                }
                _ => parser.parse_format_entries(&start_token, &mut format_entries, false),
            },
        )?;
        if arguments_are_renderbuffers && !format_entries.is_empty() {
            self.messages.error(
                Some(&start_token),
                "FORMAT specifier cannot be set for renderbuffers arguments",
            );
            return Err(());
        }
        self.parsed_commands.push(Command::AssertEqual {
            start_token,
            arguments_are_renderbuffers,
            argument_identifier_1: argument_identifier_1.expect("enforced by parse_parameters"),
            argument_identifier_2: argument_identifier_2.expect("enforced by parse_parameters"),
            format_entries,
        });
        Ok(())
    }

    fn parse_command_assert_pixels(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut expected = [0u8; 4];
        let mut renderbuffer_identifier = None;
        let mut rectangle = [0u32; 4];
        let mut rectangle_width_token = None;
        let mut rectangle_height_token = None;
        self.parse_parameters(
            &[
                TokenType::Expected,
                TokenType::Renderbuffer,
                TokenType::Rectangle,
            ],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Expected => {
                    expected[0] = parser.parse_uint8("r component")?;
                    expected[1] = parser.parse_uint8("g component")?;
                    expected[2] = parser.parse_uint8("b component")?;
                    expected[3] = parser.parse_uint8("a component")?;
                    Ok(())
                }
                TokenType::Renderbuffer => {
                    renderbuffer_identifier =
                        Some(parser.expect_identifier("renderbuffer identifier")?);
                    Ok(())
                }
                _ => {
                    rectangle[0] = parser.parse_uint32("x coordinate")?;
                    rectangle[1] = parser.parse_uint32("y coordinate")?;
                    rectangle_width_token = Some(parser.tokenizer.peek_next_token(true));
                    rectangle[2] = parser.parse_uint32("width")?;
                    rectangle_height_token = Some(parser.tokenizer.peek_next_token(true));
                    rectangle[3] = parser.parse_uint32("height")?;
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::AssertPixels {
            start_token,
            expected_r: expected[0],
            expected_g: expected[1],
            expected_b: expected[2],
            expected_a: expected[3],
            renderbuffer_identifier: renderbuffer_identifier.expect("enforced by parse_parameters"),
            rectangle_x: rectangle[0],
            rectangle_y: rectangle[1],
            rectangle_width: rectangle[2],
            rectangle_height: rectangle[3],
            rectangle_width_token: rectangle_width_token.expect("enforced by parse_parameters"),
            rectangle_height_token: rectangle_height_token.expect("enforced by parse_parameters"),
        });
        Ok(())
    }

    fn parse_command_assert_similar_emd_histogram(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut renderbuffer_identifier_1 = None;
        let mut renderbuffer_identifier_2 = None;
        let mut tolerance = 0.0f32;
        self.parse_parameters(
            &[TokenType::Renderbuffers, TokenType::Tolerance],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Renderbuffers => {
                    renderbuffer_identifier_1 = Some(
                        parser
                            .expect_identifier("identifier for first renderbuffer to be compared")?,
                    );
                    renderbuffer_identifier_2 = Some(
                        parser
                            .expect_identifier("identifier for second renderbuffer to be compared")?,
                    );
                    Ok(())
                }
                _ => {
                    tolerance = parser.parse_float("tolerance")?;
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::AssertSimilarEmdHistogram {
            start_token,
            renderbuffer_identifier_1: renderbuffer_identifier_1
                .expect("enforced by parse_parameters"),
            renderbuffer_identifier_2: renderbuffer_identifier_2
                .expect("enforced by parse_parameters"),
            tolerance,
        });
        Ok(())
    }

    fn parse_command_bind_sampler(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut sampler_identifier = None;
        let mut texture_unit = 0u32;
        self.parse_parameters(
            &[TokenType::Sampler, TokenType::TextureUnit],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Sampler => {
                    sampler_identifier =
                        Some(parser.expect_identifier("identifier for the sampler being bound")?);
                    Ok(())
                }
                _ => {
                    texture_unit = parser.parse_uint32("texture unit")?;
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::BindSampler {
            start_token,
            sampler_identifier: sampler_identifier.expect("enforced by parse_parameters"),
            texture_unit,
        });
        Ok(())
    }

    fn parse_command_bind_shader_storage_buffer(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut buffer_identifier = None;
        let mut binding = 0u32;
        self.parse_parameters(
            &[TokenType::Buffer, TokenType::Binding],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Buffer => {
                    buffer_identifier =
                        Some(parser.expect_identifier("identifier for storage buffer")?);
                    Ok(())
                }
                _ => {
                    binding = parser.parse_uint32("binding")?;
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::BindShaderStorageBuffer {
            start_token,
            buffer_identifier: buffer_identifier.expect("enforced by parse_parameters"),
            binding,
        });
        Ok(())
    }

    fn parse_command_bind_texture(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut texture_identifier = None;
        let mut texture_unit = 0u32;
        self.parse_parameters(
            &[TokenType::Texture, TokenType::TextureUnit],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Texture => {
                    texture_identifier =
                        Some(parser.expect_identifier("identifier for the texture being bound")?);
                    Ok(())
                }
                _ => {
                    texture_unit = parser.parse_uint32("texture unit")?;
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::BindTexture {
            start_token,
            texture_identifier: texture_identifier.expect("enforced by parse_parameters"),
            texture_unit,
        });
        Ok(())
    }

    fn parse_command_bind_uniform_buffer(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut buffer_identifier = None;
        let mut binding = 0u32;
        self.parse_parameters(
            &[TokenType::Buffer, TokenType::Binding],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Buffer => {
                    buffer_identifier =
                        Some(parser.expect_identifier("identifier for uniform buffer")?);
                    Ok(())
                }
                _ => {
                    binding = parser.parse_uint32("binding")?;
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::BindUniformBuffer {
            start_token,
            buffer_identifier: buffer_identifier.expect("enforced by parse_parameters"),
            binding,
        });
        Ok(())
    }

    fn parse_command_compile_shader(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let result_identifier =
            self.expect_identifier("an identifier for the shader being compiled")?;
        let shader_token = self.tokenizer.next_token(true);
        if shader_token.ttype != TokenType::Shader {
            self.messages.error(
                Some(&shader_token),
                format!("Expected 'SHADER' keyword, got '{}'", shader_token.text),
            );
            return Err(());
        }
        let shader_identifier =
            self.expect_identifier("an identifier for the source of the shader being compiled")?;
        self.parsed_commands.push(Command::CompileShader {
            start_token,
            result_identifier,
            shader_identifier,
        });
        Ok(())
    }

    fn parse_command_create_buffer(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let result_identifier =
            self.expect_identifier("an identifier for the buffer being created")?;
        let mut size_bytes = 0u32;
        let mut size_in_bytes_token = None;
        let mut values: Vec<ValuesSegment> = vec![];
        self.parse_parameters(
            &[TokenType::SizeBytes, TokenType::InitValues],
            &[],
            &[],
            |parser, key| match key {
                TokenType::SizeBytes => {
                    size_in_bytes_token = Some(parser.tokenizer.peek_next_token(true));
                    size_bytes = parser.parse_uint32("size")?;
                    Ok(())
                }
                _ => loop {
                    match parser.tokenizer.peek_next_token(true).ttype {
                        TokenType::TypeByte
                        | TokenType::TypeFloat
                        | TokenType::TypeInt
                        | TokenType::TypeUint => {
                            let segment = parser.parse_values_segment()?;
                            values.push(segment);
                        }
                        _ => return Ok(()),
                    }
                },
            },
        )?;
        let actual_size: usize = values.iter().map(|segment| segment.size_bytes()).sum();
        if size_bytes as usize != actual_size {
            self.messages.error(
                size_in_bytes_token.as_ref(),
                format!(
                    "Declared size in bytes {} does not match the combined size of the provided \
                     initial values, which is {}",
                    size_bytes, actual_size
                ),
            );
            return Err(());
        }
        let initial_data = values
            .iter()
            .flat_map(|segment| segment.data().to_vec())
            .collect();
        self.parsed_commands.push(Command::CreateBuffer {
            start_token,
            result_identifier,
            size_bytes,
            initial_data,
        });
        Ok(())
    }

    fn parse_command_create_empty_texture_2d(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let result_identifier = self.expect_identifier("identifier for texture")?;
        let (width, height) = self.parse_width_and_height()?;
        self.parsed_commands.push(Command::CreateEmptyTexture2d {
            start_token,
            result_identifier,
            width,
            height,
        });
        Ok(())
    }

    fn parse_command_create_program(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let result_identifier =
            self.expect_identifier("an identifier for the program being created")?;
        let shaders_token = self.tokenizer.next_token(true);
        if shaders_token.ttype != TokenType::Shaders {
            self.messages.error(
                Some(&shaders_token),
                format!(
                    "Expected keyword 'SHADERS' before the series of compiled shaders for the \
                     program, got '{}'",
                    shaders_token.text
                ),
            );
            return Err(());
        }
        let should_be_first_shader = self.tokenizer.peek_next_token(true);
        if !should_be_first_shader.is_identifier() {
            self.messages.error(
                Some(&should_be_first_shader),
                format!(
                    "Expected the identifier of at least one compiled shader, got '{}'",
                    should_be_first_shader.text
                ),
            );
            return Err(());
        }
        let mut compiled_shader_identifiers = vec![];
        while self.tokenizer.peek_next_token(true).is_identifier() {
            compiled_shader_identifiers.push(self.tokenizer.next_token(true));
        }
        self.parsed_commands.push(Command::CreateProgram {
            start_token,
            result_identifier,
            compiled_shader_identifiers,
        });
        Ok(())
    }

    fn parse_command_create_renderbuffer(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let result_identifier =
            self.expect_identifier("an identifier for the renderbuffer being created")?;
        let (width, height) = self.parse_width_and_height()?;
        self.parsed_commands.push(Command::CreateRenderbuffer {
            start_token,
            result_identifier,
            width,
            height,
        });
        Ok(())
    }

    fn parse_command_create_sampler(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let result_identifier = self.expect_identifier("identifier for the sampler being created")?;
        self.parsed_commands.push(Command::CreateSampler {
            start_token,
            result_identifier,
        });
        Ok(())
    }

    fn parse_command_declare_shader(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let result_identifier =
            self.expect_identifier("an identifier for the shader being declared")?;
        let shader_kind = self.tokenizer.next_token(true);
        let kind = match shader_kind.ttype {
            TokenType::Vertex => ShaderKind::Vertex,
            TokenType::Fragment => ShaderKind::Fragment,
            TokenType::Compute => ShaderKind::Compute,
            _ => {
                self.messages.error(
                    Some(&shader_kind),
                    format!(
                        "Expected 'VERTEX', 'FRAGMENT' or 'COMPUTE' to specify which kind of \
                         shader this is, got '{}'",
                        shader_kind.text
                    ),
                );
                return Err(());
            }
        };
        // The shader text must start on the next line; the rest of this line
        // may only hold whitespace and a comment.
        let skipped_comment = self.tokenizer.skip_single_line_of_whitespace_and_comments();
        if shader_kind.location.line == self.tokenizer.line() {
            self.messages.error(
                Some(&shader_kind),
                format!(
                    "Shader text should begin on the line directly following the '{}' keyword",
                    shader_kind.text
                ),
            );
            return Err(());
        }
        if skipped_comment.text.starts_with("#version ") {
            self.messages.warning(
                Some(&skipped_comment),
                "'#version ...' will be treated as a comment. If it is supposed to be the first \
                 line of shader code, it should start on the following line",
            );
        }
        let shader_start_line = self.tokenizer.line();
        let mut shader_text = String::new();
        loop {
            let token = self.tokenizer.peek_next_token(false);
            if token.is_eos() {
                self.messages.error(
                    Some(&token),
                    "Unexpected end of script when processing shader text",
                );
                return Err(());
            }
            if token.text == "END" {
                break;
            }
            shader_text.push_str(&self.tokenizer.skip_line());
        }
        self.tokenizer.next_token(true);
        self.parsed_commands.push(Command::DeclareShader {
            start_token,
            result_identifier,
            kind,
            shader_text,
            shader_start_line,
        });
        Ok(())
    }

    fn parse_command_dump_buffer_binary(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut buffer_identifier = None;
        let mut filename = None;
        self.parse_parameters(
            &[TokenType::Buffer, TokenType::File],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Buffer => {
                    buffer_identifier = Some(parser.expect_identifier("buffer identifier")?);
                    Ok(())
                }
                _ => {
                    filename = Some(parser.expect_string("file to which to dump buffer")?);
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::DumpBufferBinary {
            start_token,
            buffer_identifier: buffer_identifier.expect("enforced by parse_parameters"),
            filename: filename.expect("enforced by parse_parameters"),
        });
        Ok(())
    }

    fn parse_command_dump_buffer_text(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut buffer_identifier = None;
        let mut filename = None;
        let mut format_entries = vec![];
        self.parse_parameters(
            &[TokenType::Buffer, TokenType::File, TokenType::Format],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Buffer => {
                    buffer_identifier = Some(parser.expect_identifier("buffer identifier")?);
                    Ok(())
                }
                TokenType::File => {
                    filename = Some(parser.expect_string("file to which to dump buffer")?);
                    Ok(())
                }
                _ => parser.parse_format_entries(&start_token, &mut format_entries, true),
            },
        )?;
        self.parsed_commands.push(Command::DumpBufferText {
            start_token,
            buffer_identifier: buffer_identifier.expect("enforced by parse_parameters"),
            filename: filename.expect("enforced by parse_parameters"),
            format_entries,
        });
        Ok(())
    }

    fn parse_command_dump_renderbuffer(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut renderbuffer_identifier = None;
        let mut filename = None;
        self.parse_parameters(
            &[TokenType::Renderbuffer, TokenType::File],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Renderbuffer => {
                    renderbuffer_identifier =
                        Some(parser.expect_identifier("renderbuffer identifier")?);
                    Ok(())
                }
                _ => {
                    filename = Some(parser.expect_string("file to which to dump renderbuffer")?);
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::DumpRenderbuffer {
            start_token,
            renderbuffer_identifier: renderbuffer_identifier
                .expect("enforced by parse_parameters"),
            filename: filename.expect("enforced by parse_parameters"),
        });
        Ok(())
    }

    fn parse_command_run_compute(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut program_identifier = None;
        let mut num_groups = [0u32; 3];
        self.parse_parameters(
            &[TokenType::Program, TokenType::NumGroups],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Program => {
                    program_identifier = Some(
                        parser.expect_identifier("an identifier for the compute program to be run")?,
                    );
                    Ok(())
                }
                _ => {
                    for entry in num_groups.iter_mut() {
                        *entry = parser.parse_uint32("number of groups")?;
                    }
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::RunCompute {
            start_token,
            program_identifier: program_identifier.expect("enforced by parse_parameters"),
            num_groups_x: num_groups[0],
            num_groups_y: num_groups[1],
            num_groups_z: num_groups[2],
        });
        Ok(())
    }

    fn parse_command_run_graphics(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut program_identifier = None;
        let mut vertex_data = std::collections::BTreeMap::new();
        let mut index_data_buffer_identifier = None;
        let mut vertex_count = 0u32;
        let mut topology = Topology::Triangles;
        let mut framebuffer_attachments = std::collections::BTreeMap::new();
        self.parse_parameters(
            &[
                TokenType::Program,
                TokenType::VertexData,
                TokenType::IndexData,
                TokenType::VertexCount,
                TokenType::Topology,
                TokenType::FramebufferAttachments,
            ],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Program => {
                    program_identifier = Some(
                        parser
                            .expect_identifier("an identifier for the graphics program to be run")?,
                    );
                    Ok(())
                }
                TokenType::VertexData => parser.parse_vertex_data_list(&mut vertex_data),
                TokenType::IndexData => {
                    index_data_buffer_identifier =
                        Some(parser.expect_identifier("identifier for index data buffer")?);
                    Ok(())
                }
                TokenType::VertexCount => {
                    vertex_count = parser.parse_uint32("vertex count")?;
                    Ok(())
                }
                TokenType::Topology => {
                    let token = parser.tokenizer.next_token(true);
                    if token.ttype != TokenType::Triangles {
                        parser.messages.error(
                            Some(&token),
                            format!("Unknown or unsupported topology: '{}'", token.text),
                        );
                        return Err(());
                    }
                    topology = Topology::Triangles;
                    Ok(())
                }
                _ => parser.parse_framebuffer_attachment_list(&mut framebuffer_attachments),
            },
        )?;
        self.parsed_commands.push(Command::RunGraphics {
            start_token,
            program_identifier: program_identifier.expect("enforced by parse_parameters"),
            vertex_data,
            index_data_buffer_identifier: index_data_buffer_identifier
                .expect("enforced by parse_parameters"),
            vertex_count,
            topology,
            framebuffer_attachments,
        });
        Ok(())
    }

    fn parse_command_set_sampler_parameter(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut sampler_identifier = None;
        let mut parameter = None;
        let mut parameter_value = None;
        self.parse_parameters(
            &[
                TokenType::Sampler,
                TokenType::Parameter,
                TokenType::Value,
            ],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Sampler => {
                    sampler_identifier =
                        Some(parser.expect_identifier("identifier for target sampler")?);
                    Ok(())
                }
                TokenType::Parameter => {
                    parameter = Some(parser.parse_texture_parameter("sampler")?);
                    Ok(())
                }
                _ => {
                    parameter_value = Some(parser.parse_texture_parameter_value("sampler")?);
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::SetSamplerParameter {
            start_token,
            sampler_identifier: sampler_identifier.expect("enforced by parse_parameters"),
            parameter: parameter.expect("enforced by parse_parameters"),
            parameter_value: parameter_value.expect("enforced by parse_parameters"),
        });
        Ok(())
    }

    fn parse_command_set_texture_parameter(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut texture_identifier = None;
        let mut parameter = None;
        let mut parameter_value = None;
        self.parse_parameters(
            &[
                TokenType::Texture,
                TokenType::Parameter,
                TokenType::Value,
            ],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Texture => {
                    texture_identifier =
                        Some(parser.expect_identifier("identifier for target texture")?);
                    Ok(())
                }
                TokenType::Parameter => {
                    parameter = Some(parser.parse_texture_parameter("texture")?);
                    Ok(())
                }
                _ => {
                    parameter_value = Some(parser.parse_texture_parameter_value("texture")?);
                    Ok(())
                }
            },
        )?;
        self.parsed_commands.push(Command::SetTextureParameter {
            start_token,
            texture_identifier: texture_identifier.expect("enforced by parse_parameters"),
            parameter: parameter.expect("enforced by parse_parameters"),
            parameter_value: parameter_value.expect("enforced by parse_parameters"),
        });
        Ok(())
    }

    fn parse_command_set_uniform(&mut self) -> ParseResult<()> {
        let start_token = self.tokenizer.next_token(true);
        let mut program_identifier = None;
        let mut location = 0u32;
        let mut name = None;
        let mut element_type = None;
        let mut array_size = None;
        let mut values: Vec<Token> = vec![];
        self.parse_parameters(
            &[
                TokenType::Program,
                TokenType::Location,
                TokenType::Name,
                TokenType::Type,
                TokenType::Values,
            ],
            &[(TokenType::Location, TokenType::Name)],
            &[],
            |parser, key| match key {
                TokenType::Program => {
                    program_identifier = Some(
                        parser
                            .expect_identifier("identifier of program for which uniform is to be set")?,
                    );
                    Ok(())
                }
                TokenType::Location => {
                    location = parser.parse_uint32("location")?;
                    Ok(())
                }
                TokenType::Name => {
                    name = Some(parser.expect_string("string for uniform name")?);
                    Ok(())
                }
                TokenType::Type => {
                    let (parsed_type, parsed_array_size) = parser.parse_uniform_type()?;
                    element_type = Some(parsed_type);
                    array_size = parsed_array_size;
                    Ok(())
                }
                _ => {
                    loop {
                        let peeked = parser.tokenizer.peek_next_token(true);
                        if !peeked.is_int_literal() && !peeked.is_float_literal() {
                            break;
                        }
                        values.push(parser.tokenizer.next_token(true));
                    }
                    Ok(())
                }
            },
        )?;
        let element_type = element_type.expect("enforced by parse_parameters");
        let value = self.process_uniform_value(&start_token, element_type, array_size, &values)?;
        let target = match name {
            Some(name) => UniformTarget::Name(name),
            None => UniformTarget::Location(location),
        };
        self.parsed_commands.push(Command::SetUniform {
            start_token,
            program_identifier: program_identifier.expect("enforced by parse_parameters"),
            target,
            value,
        });
        Ok(())
    }

    // Type checking of the collected literal run happens here, after the
    // whole run is in hand, so a mismatch is reported at the offending
    // literal rather than at the start of the list.
    fn process_uniform_value(
        &mut self,
        start_token: &Token,
        element_type: ElementType,
        array_size: Option<usize>,
        values: &[Token],
    ) -> ParseResult<UniformValue> {
        let built = match element_type.scalar_kind() {
            ScalarKind::Int => {
                let mut int_values = vec![];
                for value in values {
                    if !value.is_int_literal() {
                        self.messages.error(
                            Some(value),
                            format!(
                                "Found non-integer value '{}' for integer uniform",
                                value.text
                            ),
                        );
                        return Err(());
                    }
                    let Ok(parsed) = value.text.parse::<i32>() else {
                        self.messages.error(
                            Some(value),
                            format!("Value '{}' is out of range", value.text),
                        );
                        return Err(());
                    };
                    int_values.push(parsed);
                }
                UniformValue::from_ints(element_type, &int_values, array_size)
            }
            ScalarKind::Uint => {
                let mut uint_values = vec![];
                for value in values {
                    let parsed = value.text.parse::<i64>().ok().filter(|parsed| *parsed >= 0);
                    let Some(parsed) = parsed.filter(|_| value.is_int_literal()) else {
                        self.messages.error(
                            Some(value),
                            format!(
                                "An unsigned uniform requires a non-negative integer value, \
                                 got '{}'",
                                value.text
                            ),
                        );
                        return Err(());
                    };
                    if parsed > u32::MAX as i64 {
                        self.messages.error(
                            Some(value),
                            format!("Value '{}' is out of range", value.text),
                        );
                        return Err(());
                    }
                    uint_values.push(parsed as u32);
                }
                UniformValue::from_uints(element_type, &uint_values, array_size)
            }
            ScalarKind::Float => {
                let mut float_values = vec![];
                for value in values {
                    let parsed = value.text.parse::<f32>().ok();
                    let Some(parsed) = parsed.filter(|_| value.is_float_literal()) else {
                        self.messages.error(
                            Some(value),
                            format!("Found non-float value '{}' for float uniform", value.text),
                        );
                        return Err(());
                    };
                    float_values.push(parsed);
                }
                UniformValue::from_floats(element_type, &float_values, array_size)
            }
        };
        match built {
            Ok(value) => Ok(value),
            Err(text) => {
                self.messages.error(Some(start_token), text);
                Err(())
            }
        }
    }

    fn parse_uniform_type(&mut self) -> ParseResult<(ElementType, Option<usize>)> {
        let token = self.tokenizer.next_token(true);
        let element_type = match token.ttype {
            TokenType::TypeFloat => ElementType::Float,
            TokenType::TypeVec2 => ElementType::Vec2,
            TokenType::TypeVec3 => ElementType::Vec3,
            TokenType::TypeVec4 => ElementType::Vec4,
            TokenType::TypeInt => ElementType::Int,
            TokenType::TypeIvec2 => ElementType::Ivec2,
            TokenType::TypeIvec3 => ElementType::Ivec3,
            TokenType::TypeIvec4 => ElementType::Ivec4,
            TokenType::TypeUint => ElementType::Uint,
            TokenType::TypeUvec2 => ElementType::Uvec2,
            TokenType::TypeUvec3 => ElementType::Uvec3,
            TokenType::TypeUvec4 => ElementType::Uvec4,
            TokenType::TypeMat2x2 => ElementType::Mat2x2,
            TokenType::TypeMat2x3 => ElementType::Mat2x3,
            TokenType::TypeMat2x4 => ElementType::Mat2x4,
            TokenType::TypeMat3x2 => ElementType::Mat3x2,
            TokenType::TypeMat3x3 => ElementType::Mat3x3,
            TokenType::TypeMat3x4 => ElementType::Mat3x4,
            TokenType::TypeMat4x2 => ElementType::Mat4x2,
            TokenType::TypeMat4x3 => ElementType::Mat4x3,
            TokenType::TypeMat4x4 => ElementType::Mat4x4,
            TokenType::TypeSampler2d => ElementType::Sampler2d,
            _ => {
                self.messages
                    .error(Some(&token), format!("Unexpected type '{}'", token.text));
                return Err(());
            }
        };
        if self.tokenizer.peek_next_token(true).ttype != TokenType::SquareBracketOpen {
            return Ok((element_type, None));
        }
        self.tokenizer.next_token(true);
        let array_size = self.parse_uint32("array size")?;
        let close = self.tokenizer.next_token(true);
        if close.ttype != TokenType::SquareBracketClose {
            self.messages
                .error(Some(&close), format!("Expected ']', got '{}'", close.text));
            return Err(());
        }
        Ok((element_type, Some(array_size as usize)))
    }

    fn parse_texture_parameter(&mut self, target: &str) -> ParseResult<TextureParameter> {
        let token = self.tokenizer.next_token(true);
        match token.ttype {
            TokenType::TextureMagFilter => Ok(TextureParameter::MagFilter),
            TokenType::TextureMinFilter => Ok(TextureParameter::MinFilter),
            _ => {
                self.messages.error(
                    Some(&token),
                    format!("Unknown {} parameter '{}'", target, token.text),
                );
                Err(())
            }
        }
    }

    fn parse_texture_parameter_value(&mut self, target: &str) -> ParseResult<TextureParameterValue> {
        let token = self.tokenizer.next_token(true);
        match token.ttype {
            TokenType::Linear => Ok(TextureParameterValue::Linear),
            TokenType::Nearest => Ok(TextureParameterValue::Nearest),
            _ => {
                self.messages.error(
                    Some(&token),
                    format!("Unknown {} parameter value '{}'", target, token.text),
                );
                Err(())
            }
        }
    }

    fn parse_width_and_height(&mut self) -> ParseResult<(u32, u32)> {
        let mut width = 0u32;
        let mut height = 0u32;
        self.parse_parameters(
            &[TokenType::Width, TokenType::Height],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Width => {
                    width = parser.parse_uint32("width")?;
                    Ok(())
                }
                _ => {
                    height = parser.parse_uint32("height")?;
                    Ok(())
                }
            },
        )?;
        Ok((width, height))
    }

    fn parse_vertex_data_list(
        &mut self,
        vertex_data: &mut std::collections::BTreeMap<u32, VertexAttributeInfo>,
    ) -> ParseResult<()> {
        let token = self.tokenizer.next_token(true);
        if token.ttype != TokenType::SquareBracketOpen {
            self.messages.error(
                Some(&token),
                format!(
                    "Expected '[' to commence start of vertex data, got '{}'",
                    token.text
                ),
            );
            return Err(());
        }
        let mut observed_locations: HashMap<u32, Token> = HashMap::new();
        while self.tokenizer.peek_next_token(true).ttype != TokenType::SquareBracketClose {
            let location_token = self.tokenizer.peek_next_token(true);
            let location = self.parse_uint32("location")?;
            if let Some(previous) = observed_locations.get(&location) {
                self.messages.error(
                    Some(&location_token),
                    format!(
                        "Duplicate key: {} is already used as a key at {}",
                        location, previous.location
                    ),
                );
                return Err(());
            }
            observed_locations.insert(location, location_token);
            let arrow = self.tokenizer.next_token(true);
            if arrow.ttype != TokenType::Arrow {
                self.messages
                    .error(Some(&arrow), format!("Expected '->', got '{}'", arrow.text));
                return Err(());
            }
            let attribute = self.parse_vertex_attribute_info()?;
            vertex_data.insert(location, attribute);
            let next = self.tokenizer.peek_next_token(true);
            if next.ttype == TokenType::Comma {
                self.tokenizer.next_token(true);
            } else if next.ttype != TokenType::SquareBracketClose {
                self.messages.error(
                    Some(&next),
                    format!("Expected ',' or ']', got '{}'", next.text),
                );
                return Err(());
            }
        }
        self.tokenizer.next_token(true);
        Ok(())
    }

    fn parse_vertex_attribute_info(&mut self) -> ParseResult<VertexAttributeInfo> {
        let mut buffer_identifier = None;
        let mut offset_bytes = 0u32;
        let mut stride_bytes = 0u32;
        let mut dimension = 0u32;
        self.parse_parameters(
            &[
                TokenType::Buffer,
                TokenType::OffsetBytes,
                TokenType::StrideBytes,
                TokenType::Dimension,
            ],
            &[],
            &[],
            |parser, key| match key {
                TokenType::Buffer => {
                    buffer_identifier =
                        Some(parser.expect_identifier("identifier for vertex buffer")?);
                    Ok(())
                }
                TokenType::OffsetBytes => {
                    offset_bytes = parser.parse_uint32("offset")?;
                    Ok(())
                }
                TokenType::StrideBytes => {
                    stride_bytes = parser.parse_uint32("stride")?;
                    Ok(())
                }
                _ => {
                    dimension = parser.parse_uint32("dimension")?;
                    Ok(())
                }
            },
        )?;
        Ok(VertexAttributeInfo {
            buffer_identifier: buffer_identifier.expect("enforced by parse_parameters"),
            offset_bytes,
            stride_bytes,
            dimension,
        })
    }

    fn parse_framebuffer_attachment_list(
        &mut self,
        framebuffer_attachments: &mut std::collections::BTreeMap<u32, Token>,
    ) -> ParseResult<()> {
        let token = self.tokenizer.next_token(true);
        if token.ttype != TokenType::SquareBracketOpen {
            self.messages.error(
                Some(&token),
                format!(
                    "Expected '[' to commence start of framebuffer attachments, got '{}'",
                    token.text
                ),
            );
            return Err(());
        }
        let mut observed_locations: HashMap<u32, Token> = HashMap::new();
        let mut observed_identifiers: HashMap<String, Token> = HashMap::new();
        while self.tokenizer.peek_next_token(true).ttype != TokenType::SquareBracketClose {
            let location_token = self.tokenizer.peek_next_token(true);
            let location = self.parse_uint32("location")?;
            if let Some(previous) = observed_locations.get(&location) {
                self.messages.error(
                    Some(&location_token),
                    format!(
                        "Duplicate key: {} is already used as a key at {}",
                        location, previous.location
                    ),
                );
                return Err(());
            }
            observed_locations.insert(location, location_token);
            let arrow = self.tokenizer.next_token(true);
            if arrow.ttype != TokenType::Arrow {
                self.messages
                    .error(Some(&arrow), format!("Expected '->', got '{}'", arrow.text));
                return Err(());
            }
            let identifier = self.tokenizer.next_token(true);
            if !identifier.is_identifier() {
                self.messages.error(
                    Some(&identifier),
                    format!(
                        "Expected identifier for framebuffer attachment, got '{}'",
                        identifier.text
                    ),
                );
                return Err(());
            }
            if let Some(previous) = observed_identifiers.get(&identifier.text) {
                self.messages.error(
                    Some(&identifier),
                    format!(
                        "Duplicate attachment: '{}' is already attached at {}",
                        identifier.text, previous.location
                    ),
                );
                return Err(());
            }
            observed_identifiers.insert(identifier.text.clone(), identifier.clone());
            framebuffer_attachments.insert(location, identifier);
            let next = self.tokenizer.peek_next_token(true);
            if next.ttype == TokenType::Comma {
                self.tokenizer.next_token(true);
            } else if next.ttype != TokenType::SquareBracketClose {
                self.messages.error(
                    Some(&next),
                    format!("Expected ',' or ']', got '{}'", next.text),
                );
                return Err(());
            }
        }
        self.tokenizer.next_token(true);
        Ok(())
    }

    fn parse_format_entries(
        &mut self,
        start_token: &Token,
        entries: &mut Vec<FormatEntry>,
        allow_string_literals: bool,
    ) -> ParseResult<()> {
        loop {
            let peeked = self.tokenizer.peek_next_token(true);
            let kind = match peeked.ttype {
                TokenType::SkipBytes => FormatEntryKind::Skip,
                TokenType::TypeByte => FormatEntryKind::Byte,
                TokenType::TypeFloat => FormatEntryKind::Float,
                TokenType::TypeInt => FormatEntryKind::Int,
                TokenType::TypeUint => FormatEntryKind::Uint,
                TokenType::String if allow_string_literals => FormatEntryKind::Literal,
                _ => {
                    if entries.is_empty() {
                        self.messages
                            .error(Some(start_token), "Missing identifier after FORMAT");
                        return Err(());
                    }
                    return Ok(());
                }
            };
            let format_start_token = self.tokenizer.next_token(true);
            let count = if kind == FormatEntryKind::Literal {
                0
            } else {
                self.parse_uint32("count")?
            };
            entries.push(FormatEntry {
                token: format_start_token,
                kind,
                count,
            });
        }
    }

    fn parse_values_segment(&mut self) -> ParseResult<ValuesSegment> {
        let token = self.tokenizer.next_token(true);
        match token.ttype {
            TokenType::TypeByte => {
                let mut byte_data = vec![];
                while self.tokenizer.peek_next_token(true).is_int_literal() {
                    byte_data.push(self.parse_uint8("value")?);
                }
                if byte_data.len() % 4 != 0 {
                    self.messages.error(
                        Some(&token),
                        format!(
                            "The number of byte literals supplied in a buffer initializer must \
                             be a multiple of 4; found a sequence of {} literals",
                            byte_data.len()
                        ),
                    );
                    return Err(());
                }
                Ok(ValuesSegment::from_bytes(&byte_data))
            }
            TokenType::TypeFloat => {
                let mut float_data = vec![];
                while self.tokenizer.peek_next_token(true).is_float_literal() {
                    float_data.push(self.parse_float("value")?);
                }
                Ok(ValuesSegment::from_floats(&float_data))
            }
            TokenType::TypeInt => {
                let mut int_data = vec![];
                while self.tokenizer.peek_next_token(true).is_int_literal() {
                    let value = self.tokenizer.next_token(true);
                    let Ok(parsed) = value.text.parse::<i32>() else {
                        self.messages.error(
                            Some(&value),
                            format!("Value '{}' is out of range", value.text),
                        );
                        return Err(());
                    };
                    int_data.push(parsed);
                }
                Ok(ValuesSegment::from_ints(&int_data))
            }
            _ => {
                let mut uint_data = vec![];
                while self.tokenizer.peek_next_token(true).is_int_literal() {
                    uint_data.push(self.parse_uint32("value")?);
                }
                Ok(ValuesSegment::from_uints(&uint_data))
            }
        }
    }

    /// Shared tail protocol: an unordered set of `KEYWORD value...` clauses.
    /// Loops while the next token is one of `expected`, rejecting repeats;
    /// afterwards every missing non-optional keyword is reported, so one
    /// call surfaces every omission at once.
    fn parse_parameters(
        &mut self,
        expected: &[TokenType],
        mutually_exclusive: &[(TokenType, TokenType)],
        optional: &[TokenType],
        mut parse_clause: impl FnMut(&mut Self, TokenType) -> ParseResult<()>,
    ) -> ParseResult<()> {
        let mut observed: HashMap<TokenType, Token> = HashMap::new();
        loop {
            let token = self.tokenizer.peek_next_token(true);
            if !expected.contains(&token.ttype) {
                break;
            }
            if let Some(previous) = observed.get(&token.ttype) {
                self.messages.error(
                    Some(&token),
                    format!(
                        "Duplicate parameter '{}'; already provided at {}",
                        token.text, previous.location
                    ),
                );
                return Err(());
            }
            observed.insert(token.ttype, token.clone());
            self.tokenizer.next_token(true);
            parse_clause(self, token.ttype)?;
        }

        let after_tail = self.tokenizer.peek_next_token(true);
        let mut found_errors = false;
        let mut already_handled: HashSet<TokenType> = HashSet::new();
        for (first, second) in mutually_exclusive {
            match (observed.get(first), observed.get(second)) {
                (Some(first_token), Some(second_token)) => {
                    self.messages.error(
                        Some(first_token),
                        format!(
                            "Parameters '{}' and '{}' are mutually exclusive; both are present \
                             at {} and {}",
                            first_token.text,
                            second_token.text,
                            first_token.location,
                            second_token.location
                        ),
                    );
                    found_errors = true;
                }
                (None, None) => {
                    self.messages.error(
                        Some(&after_tail),
                        format!(
                            "Missing parameter '{}' or '{}'",
                            keyword_to_string(*first),
                            keyword_to_string(*second)
                        ),
                    );
                    found_errors = true;
                }
                _ => {}
            }
            already_handled.insert(*first);
            already_handled.insert(*second);
        }
        for ttype in expected {
            if !already_handled.contains(ttype)
                && !optional.contains(ttype)
                && !observed.contains_key(ttype)
            {
                self.messages.error(
                    Some(&after_tail),
                    format!("Missing parameter '{}'", keyword_to_string(*ttype)),
                );
                found_errors = true;
            }
        }
        if found_errors {
            return Err(());
        }
        Ok(())
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<Token> {
        let token = self.tokenizer.next_token(true);
        if !token.is_identifier() {
            self.messages.error(
                Some(&token),
                format!("Expected {}, got '{}'", what, token.text),
            );
            return Err(());
        }
        Ok(token)
    }

    fn expect_string(&mut self, what: &str) -> ParseResult<Token> {
        let token = self.tokenizer.next_token(true);
        if !token.is_string() {
            self.messages.error(
                Some(&token),
                format!("Expected {}, got '{}'", what, token.text),
            );
            return Err(());
        }
        Ok(token)
    }

    fn parse_uint8(&mut self, result_name: &str) -> ParseResult<u8> {
        let token = self.tokenizer.next_token(true);
        if !token.is_int_literal() {
            self.messages.error(
                Some(&token),
                format!("Expected integer {}, got '{}'", result_name, token.text),
            );
            return Err(());
        }
        match token.text.parse::<i64>() {
            Ok(value) if (0..=u8::MAX as i64).contains(&value) => Ok(value as u8),
            _ => {
                self.messages.error(
                    Some(&token),
                    format!(
                        "Expected integer {} in the range [0, 255], got '{}'",
                        result_name, token.text
                    ),
                );
                Err(())
            }
        }
    }

    fn parse_uint32(&mut self, result_name: &str) -> ParseResult<u32> {
        let token = self.tokenizer.next_token(true);
        if !token.is_int_literal() {
            self.messages.error(
                Some(&token),
                format!("Expected integer {}, got '{}'", result_name, token.text),
            );
            return Err(());
        }
        match token.text.parse::<i64>() {
            Ok(value) if value < 0 => {
                self.messages.error(
                    Some(&token),
                    format!(
                        "Expected non-negative integer {}, got '{}'",
                        result_name, token.text
                    ),
                );
                Err(())
            }
            Ok(value) if value > u32::MAX as i64 => {
                self.messages.error(
                    Some(&token),
                    format!("Value '{}' is out of range", token.text),
                );
                Err(())
            }
            Ok(value) => Ok(value as u32),
            Err(_) => {
                self.messages.error(
                    Some(&token),
                    format!("Value '{}' is out of range", token.text),
                );
                Err(())
            }
        }
    }

    fn parse_float(&mut self, result_name: &str) -> ParseResult<f32> {
        let token = self.tokenizer.next_token(true);
        let parsed = token.text.parse::<f32>().ok();
        match parsed.filter(|_| token.is_float_literal()) {
            Some(value) => Ok(value),
            None => {
                self.messages.error(
                    Some(&token),
                    format!("Expected float {}, got '{}'", result_name, token.text),
                );
                Err(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::api_version::{Api, ApiVersion};
    use super::super::command::{Command, FormatEntryKind, ShaderKind, UniformTarget};
    use super::super::message::MessageLog;
    use super::Parser;

    fn parse(script: &str) -> (Result<super::Program, ()>, MessageLog) {
        let mut log = MessageLog::new();
        let result = Parser::new(script, &mut log).parse();
        (result, log)
    }

    #[test]
    fn version_header_is_optional() {
        let (result, log) = parse("CREATE_SAMPLER s\n");
        assert!(log.is_empty());
        let program = result.expect("parse failed");
        assert_eq!(program.api_version(), ApiVersion::new(Api::Gles, 3, 2));
        assert_eq!(program.num_commands(), 1);
    }

    #[test]
    fn explicit_version_header() {
        let (result, _) = parse("GL 4.5\nCREATE_SAMPLER s\n");
        assert_eq!(
            result.expect("parse failed").api_version(),
            ApiVersion::new(Api::Gl, 4, 5)
        );
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let (result, log) = parse("GL 5.0\n");
        assert!(result.is_err());
        assert_eq!(log.message_string(0), "ERROR: 1:1: Unsupported OpenGL version: 5.0");

        let (result, log) = parse("GLES 3.3\n");
        assert!(result.is_err());
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:1: Unsupported OpenGL ES version: 3.3"
        );
    }

    #[test]
    fn unknown_command_aborts() {
        let (result, log) = parse("FROBNICATE x\n");
        assert!(result.is_err());
        assert_eq!(log.message_string(0), "ERROR: 1:1: Unknown command: 'FROBNICATE'");
    }

    #[test]
    fn create_buffer_various_types() {
        let script = "CREATE_BUFFER buf SIZE_BYTES 52 INIT_VALUES\n   \
                      int 1 2 3\n   \
                      float 1.0 2.0 3.0\n   \
                      uint 10 11 12\n   \
                      byte 1 2 3 4\n   \
                      int 4 5 6\n";
        let (result, log) = parse(script);
        assert!(log.is_empty(), "{:?}", log);
        let program = result.expect("parse failed");
        let Command::CreateBuffer {
            size_bytes,
            initial_data,
            ..
        } = program.command(0)
        else {
            panic!("expected CreateBuffer");
        };
        assert_eq!(*size_bytes, 52);
        assert_eq!(initial_data.len(), 52);
        let int_at = |offset: usize| {
            i32::from_le_bytes(initial_data[offset..offset + 4].try_into().unwrap())
        };
        let float_at = |offset: usize| {
            f32::from_le_bytes(initial_data[offset..offset + 4].try_into().unwrap())
        };
        let uint_at = |offset: usize| {
            u32::from_le_bytes(initial_data[offset..offset + 4].try_into().unwrap())
        };
        assert_eq!([int_at(0), int_at(4), int_at(8)], [1, 2, 3]);
        assert_eq!([float_at(12), float_at(16), float_at(20)], [1.0, 2.0, 3.0]);
        assert_eq!([uint_at(24), uint_at(28), uint_at(32)], [10, 11, 12]);
        assert_eq!(&initial_data[36..40], &[1, 2, 3, 4]);
        assert_eq!([int_at(40), int_at(44), int_at(48)], [4, 5, 6]);
    }

    #[test]
    fn create_buffer_bad_byte_multiple() {
        let script = "CREATE_BUFFER buf SIZE_BYTES 3 INIT_VALUES\n   \
                      int 3 6\n   \
                      float 3.0 byte 1 2 3 4 5 6\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 3:14: The number of byte literals supplied in a buffer initializer must be \
             a multiple of 4; found a sequence of 6 literals"
        );
    }

    #[test]
    fn create_buffer_wrong_size() {
        let script = "CREATE_BUFFER buf SIZE_BYTES 51 INIT_VALUES\n   \
                      int 1 2 3\n   \
                      float 1.0 2.0 3.0\n   \
                      uint 10 11 12\n   \
                      byte 1 2 3 4\n   \
                      int 4 5 6\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:30: Declared size in bytes 51 does not match the combined size of the \
             provided initial values, which is 52"
        );
    }

    #[test]
    fn create_program_needs_a_shader_identifier() {
        let (result, log) = parse("CREATE_PROGRAM prog SHADERS\n    ");
        assert!(result.is_err());
        assert_eq!(log.len(), 1);
        assert!(log
            .message_string(0)
            .contains("Expected the identifier of at least one compiled shader"));
    }

    #[test]
    fn shader_text_must_start_on_next_line() {
        let script = "DECLARE_SHADER s FRAGMENT version 320 es\nvoid main() {\n}\nEND\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:18: Shader text should begin on the line directly following the \
             'FRAGMENT' keyword"
        );
    }

    #[test]
    fn version_pragma_on_keyword_line_warns() {
        let script = "DECLARE_SHADER s FRAGMENT        #version 320 es\nvoid main() {\n}\nEND\n";
        let (result, log) = parse(script);
        assert!(result.is_ok());
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "WARNING: 1:34: '#version ...' will be treated as a comment. If it is supposed to \
             be the first line of shader code, it should start on the following line"
        );
    }

    #[test]
    fn shader_body_is_captured_verbatim() {
        let script = "DECLARE_SHADER s VERTEX\n#version 320 es\nvoid main() { }\nEND\n";
        let (result, log) = parse(script);
        assert!(log.is_empty(), "{:?}", log);
        let program = result.expect("parse failed");
        let Command::DeclareShader {
            kind,
            shader_text,
            shader_start_line,
            ..
        } = program.command(0)
        else {
            panic!("expected DeclareShader");
        };
        assert_eq!(*kind, ShaderKind::Vertex);
        assert_eq!(shader_text, "#version 320 es\nvoid main() { }\n");
        assert_eq!(*shader_start_line, 2);
    }

    #[test]
    fn unterminated_shader_body() {
        let (result, log) = parse("DECLARE_SHADER s VERTEX\nvoid main() { }\n");
        assert!(result.is_err());
        assert!(log
            .message_string(0)
            .contains("Unexpected end of script when processing shader text"));
    }

    #[test]
    fn duplicate_parameter_is_rejected() {
        let (result, log) = parse("CREATE_RENDERBUFFER rb WIDTH 4 WIDTH 8 HEIGHT 2\n");
        assert!(result.is_err());
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:32: Duplicate parameter 'WIDTH'; already provided at 1:24"
        );
    }

    #[test]
    fn missing_parameters_are_all_reported() {
        let (result, log) = parse("CREATE_RENDERBUFFER rb\n");
        assert!(result.is_err());
        assert_eq!(log.len(), 2);
        assert!(log.message_string(0).contains("Missing parameter 'WIDTH'"));
        assert!(log.message_string(1).contains("Missing parameter 'HEIGHT'"));
    }

    #[test]
    fn location_and_name_are_mutually_exclusive() {
        let script = "SET_UNIFORM PROGRAM p LOCATION 1 NAME \"f\" TYPE float VALUES 1.0\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:23: Parameters 'LOCATION' and 'NAME' are mutually exclusive; both are \
             present at 1:23 and 1:34"
        );
    }

    #[test]
    fn set_uniform_by_name() {
        let script = "SET_UNIFORM PROGRAM p NAME \"scale\" TYPE vec2 VALUES 1.0 2.0\n";
        let (result, log) = parse(script);
        assert!(log.is_empty(), "{:?}", log);
        let program = result.expect("parse failed");
        let Command::SetUniform { target, value, .. } = program.command(0) else {
            panic!("expected SetUniform");
        };
        let UniformTarget::Name(name) = target else {
            panic!("expected name target");
        };
        assert_eq!(name.text, "scale");
        assert_eq!(value.float_values(), vec![1.0, 2.0]);
    }

    #[test]
    fn set_uniform_rejects_wrong_literal_kind() {
        let script = "SET_UNIFORM PROGRAM p LOCATION 0 TYPE float VALUES 1\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:52: Found non-float value '1' for float uniform"
        );
    }

    #[test]
    fn set_uniform_rejects_wrong_value_count() {
        let script = "SET_UNIFORM PROGRAM p LOCATION 0 TYPE vec3 VALUES 1.0 2.0\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:1: Type 'vec3' requires 3 values, got 2"
        );
    }

    #[test]
    fn set_uniform_array() {
        let script = "SET_UNIFORM PROGRAM p LOCATION 3 TYPE int[2] VALUES 5 6\n";
        let (result, log) = parse(script);
        assert!(log.is_empty(), "{:?}", log);
        let program = result.expect("parse failed");
        let Command::SetUniform { value, .. } = program.command(0) else {
            panic!("expected SetUniform");
        };
        assert_eq!(value.array_size(), Some(2));
        assert_eq!(value.int_values(), vec![5, 6]);
    }

    #[test]
    fn unsigned_uniform_rejects_negative_values() {
        let script = "SET_UNIFORM PROGRAM p LOCATION 0 TYPE uint VALUES -1\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:51: An unsigned uniform requires a non-negative integer value, got '-1'"
        );
    }

    #[test]
    fn assert_pixels_component_range() {
        let script = "ASSERT_PIXELS RENDERBUFFER rb RECTANGLE 0 0 1 1 EXPECTED 0 0 0 256\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:64: Expected integer a component in the range [0, 255], got '256'"
        );
    }

    #[test]
    fn assert_equal_format_for_renderbuffers_is_rejected() {
        let script = "ASSERT_EQUAL RENDERBUFFERS rb1 rb2 FORMAT int 4\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:1: FORMAT specifier cannot be set for renderbuffers arguments"
        );
    }

    #[test]
    fn assert_equal_format_needs_an_entry() {
        let script = "ASSERT_EQUAL BUFFERS b1 b2 FORMAT\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert_eq!(log.message_string(0), "ERROR: 1:1: Missing identifier after FORMAT");
    }

    #[test]
    fn run_graphics_full_form() {
        let script = "RUN_GRAPHICS PROGRAM prog VERTEX_DATA [ 0 -> BUFFER vbuf OFFSET_BYTES 0 \
                      STRIDE_BYTES 8 DIMENSION 2 ] INDEX_DATA ibuf VERTEX_COUNT 3 TOPOLOGY \
                      TRIANGLES FRAMEBUFFER_ATTACHMENTS [ 0 -> rb ]\n";
        let (result, log) = parse(script);
        assert!(log.is_empty(), "{:?}", log);
        let program = result.expect("parse failed");
        let Command::RunGraphics {
            vertex_data,
            framebuffer_attachments,
            vertex_count,
            ..
        } = program.command(0)
        else {
            panic!("expected RunGraphics");
        };
        assert_eq!(*vertex_count, 3);
        assert_eq!(vertex_data.len(), 1);
        assert_eq!(vertex_data[&0].buffer_identifier.text, "vbuf");
        assert_eq!(vertex_data[&0].stride_bytes, 8);
        assert_eq!(framebuffer_attachments[&0].text, "rb");
    }

    #[test]
    fn framebuffer_attachment_duplicate_key() {
        let script = "RUN_GRAPHICS PROGRAM prog VERTEX_DATA [ ] INDEX_DATA ibuf VERTEX_COUNT 3 \
                      TOPOLOGY TRIANGLES FRAMEBUFFER_ATTACHMENTS [ 0 -> rb1 , 0 -> rb2 ]\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert!(log
            .message_string(0)
            .contains("Duplicate key: 0 is already used as a key at"));
    }

    #[test]
    fn framebuffer_attachment_duplicate_identifier() {
        let script = "RUN_GRAPHICS PROGRAM prog VERTEX_DATA [ ] INDEX_DATA ibuf VERTEX_COUNT 3 \
                      TOPOLOGY TRIANGLES FRAMEBUFFER_ATTACHMENTS [ 0 -> rb , 1 -> rb ]\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert!(log
            .message_string(0)
            .contains("Duplicate attachment: 'rb' is already attached at"));
    }

    #[test]
    fn vertex_data_duplicate_key() {
        let script = "RUN_GRAPHICS PROGRAM prog VERTEX_DATA [ 1 -> BUFFER b OFFSET_BYTES 0 \
                      STRIDE_BYTES 8 DIMENSION 2 , 1 -> BUFFER c OFFSET_BYTES 0 STRIDE_BYTES 8 \
                      DIMENSION 2 ] INDEX_DATA ibuf VERTEX_COUNT 3 TOPOLOGY TRIANGLES \
                      FRAMEBUFFER_ATTACHMENTS [ 0 -> rb ]\n";
        let (result, log) = parse(script);
        assert!(result.is_err());
        assert!(log
            .message_string(0)
            .contains("Duplicate key: 1 is already used as a key at"));
    }

    #[test]
    fn dump_buffer_text_format_entries() {
        let script = "DUMP_BUFFER_TEXT BUFFER buf FILE \"out.txt\" FORMAT \"header\" int 2 \
                      SKIP_BYTES 4 float 1\n";
        let (result, log) = parse(script);
        assert!(log.is_empty(), "{:?}", log);
        let program = result.expect("parse failed");
        let Command::DumpBufferText { format_entries, .. } = program.command(0) else {
            panic!("expected DumpBufferText");
        };
        let kinds: Vec<_> = format_entries.iter().map(|entry| entry.kind).collect();
        assert_eq!(
            kinds,
            vec![
                FormatEntryKind::Literal,
                FormatEntryKind::Int,
                FormatEntryKind::Skip,
                FormatEntryKind::Float
            ]
        );
    }

    #[test]
    fn comments_between_commands() {
        let script = "# make a sampler\nCREATE_SAMPLER s # trailing note\n# done\n";
        let (result, log) = parse(script);
        assert!(log.is_empty());
        assert_eq!(result.expect("parse failed").num_commands(), 1);
    }

    #[test]
    fn negative_size_is_rejected() {
        let (result, log) = parse("CREATE_BUFFER buf SIZE_BYTES -4 INIT_VALUES\n");
        assert!(result.is_err());
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:30: Expected non-negative integer size, got '-4'"
        );
    }

    #[test]
    fn rerunning_the_parser_gives_identical_diagnostics() {
        let script = "CREATE_BUFFER buf SIZE_BYTES 3 INIT_VALUES\n   byte 1 2 3\n";
        let (_, first_log) = parse(script);
        let (_, second_log) = parse(script);
        let first: Vec<_> = (0..first_log.len()).map(|i| first_log.message_string(i)).collect();
        let second: Vec<_> = (0..second_log.len())
            .map(|i| second_log.message_string(i))
            .collect();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }
}
