use std::collections::{HashMap, HashSet};

use super::api_version::ApiVersion;
use super::command::{Command, FormatEntry, FormatEntryKind, ShaderKind};
use super::message::MessageLog;
use super::program::Program;
use super::token::{keyword_to_string, Token, TokenType};

/// Validates cross-command semantics over a parsed program: one flat
/// identifier namespace, referential integrity, and shader composition
/// rules. Unlike the parser it keeps going after a failed command so a
/// single run surfaces as many problems as possible.
pub fn check(program: &Program, messages: &mut MessageLog) -> bool {
    let mut checker = Checker {
        messages,
        api_version: program.api_version(),
        used_identifiers: HashMap::new(),
        declared_shaders: HashMap::new(),
        compiled_shaders: HashMap::new(),
        created_buffers: HashMap::new(),
        created_programs: HashMap::new(),
        created_renderbuffers: HashMap::new(),
        created_samplers: HashSet::new(),
        created_textures: HashSet::new(),
    };
    let mut result = true;
    for command in program.commands() {
        if !checker.visit(command) {
            result = false;
        }
    }
    result
}

struct Checker<'m, 'p> {
    messages: &'m mut MessageLog,
    api_version: ApiVersion,
    used_identifiers: HashMap<&'p str, &'p Token>,
    declared_shaders: HashMap<&'p str, ShaderKind>,
    // Compiled identifier to the declared shader it was compiled from.
    compiled_shaders: HashMap<&'p str, &'p str>,
    created_buffers: HashMap<&'p str, (&'p Token, u32)>,
    created_programs: HashMap<&'p str, usize>,
    created_renderbuffers: HashMap<&'p str, (u32, u32)>,
    created_samplers: HashSet<&'p str>,
    created_textures: HashSet<&'p str>,
}

impl<'m, 'p> Checker<'m, 'p> {
    fn visit(&mut self, command: &'p Command) -> bool {
        match command {
            Command::AssertEqual { .. } => self.visit_assert_equal(command),
            Command::AssertPixels { .. } => self.visit_assert_pixels(command),
            Command::AssertSimilarEmdHistogram { .. } => {
                self.visit_assert_similar_emd_histogram(command)
            }
            Command::BindSampler {
                sampler_identifier, ..
            } => self.check_is_sampler(sampler_identifier),
            Command::BindShaderStorageBuffer {
                buffer_identifier, ..
            } => self.check_is_buffer(buffer_identifier),
            Command::BindTexture {
                texture_identifier, ..
            } => self.check_is_texture(texture_identifier),
            Command::BindUniformBuffer {
                buffer_identifier, ..
            } => self.check_is_buffer(buffer_identifier),
            Command::CompileShader { .. } => self.visit_compile_shader(command),
            Command::CreateBuffer { .. } => self.visit_create_buffer(command),
            Command::CreateEmptyTexture2d { .. } => self.visit_create_empty_texture_2d(command),
            Command::CreateProgram { .. } => self.visit_create_program(command),
            Command::CreateRenderbuffer { .. } => self.visit_create_renderbuffer(command),
            Command::CreateSampler { .. } => self.visit_create_sampler(command),
            Command::DeclareShader { .. } => self.visit_declare_shader(command),
            Command::DumpBufferBinary {
                buffer_identifier, ..
            } => self.check_is_buffer(buffer_identifier),
            Command::DumpBufferText { .. } => self.visit_dump_buffer_text(command),
            Command::DumpRenderbuffer {
                renderbuffer_identifier,
                ..
            } => self.check_is_renderbuffer(renderbuffer_identifier),
            Command::RunCompute { .. } => self.visit_run_compute(command),
            Command::RunGraphics { .. } => self.visit_run_graphics(command),
            Command::SetSamplerParameter {
                sampler_identifier, ..
            } => self.check_is_sampler(sampler_identifier),
            Command::SetTextureParameter {
                texture_identifier, ..
            } => self.check_is_texture(texture_identifier),
            Command::SetUniform {
                program_identifier, ..
            } => self.check_is_program(program_identifier),
        }
    }

    fn visit_assert_equal(&mut self, command: &'p Command) -> bool {
        let Command::AssertEqual {
            arguments_are_renderbuffers,
            argument_identifier_1,
            argument_identifier_2,
            format_entries,
            ..
        } = command
        else {
            return true;
        };
        let mut found_errors = false;
        if *arguments_are_renderbuffers {
            for operand in [argument_identifier_1, argument_identifier_2] {
                if !self.created_renderbuffers.contains_key(operand.text.as_str()) {
                    self.messages.error(
                        Some(operand),
                        format!("'{}' must be a renderbuffer", operand.text),
                    );
                    found_errors = true;
                }
            }
            if found_errors {
                return false;
            }
            return self
                .check_renderbuffer_dimensions_match(argument_identifier_1, argument_identifier_2);
        }
        for operand in [argument_identifier_1, argument_identifier_2] {
            if !self.created_buffers.contains_key(operand.text.as_str()) {
                self.messages
                    .error(Some(operand), format!("'{}' must be a buffer", operand.text));
                found_errors = true;
            }
        }
        if found_errors {
            return false;
        }
        let size_1 = self.created_buffers[argument_identifier_1.text.as_str()].1;
        let size_2 = self.created_buffers[argument_identifier_2.text.as_str()].1;
        if size_1 != size_2 {
            self.messages.error(
                Some(argument_identifier_2),
                format!(
                    "size (in bytes) {} of '{}' does not match size (in bytes) {} of '{}' at {}",
                    size_2,
                    argument_identifier_2.text,
                    size_1,
                    argument_identifier_1.text,
                    argument_identifier_1.location
                ),
            );
            found_errors = true;
        }
        if !format_entries.is_empty() {
            let display_name = format!(
                "{}({})",
                argument_identifier_1.text, argument_identifier_2.text
            );
            let (declared_at, expected_bytes) =
                self.created_buffers[argument_identifier_1.text.as_str()];
            if !self.check_format_entries(format_entries, &display_name, expected_bytes, declared_at)
            {
                found_errors = true;
            }
        }
        !found_errors
    }

    fn visit_assert_pixels(&mut self, command: &'p Command) -> bool {
        let Command::AssertPixels {
            renderbuffer_identifier,
            rectangle_x,
            rectangle_y,
            rectangle_width,
            rectangle_height,
            rectangle_width_token,
            rectangle_height_token,
            ..
        } = command
        else {
            return true;
        };
        let Some(&(width, height)) = self
            .created_renderbuffers
            .get(renderbuffer_identifier.text.as_str())
        else {
            self.messages.error(
                Some(renderbuffer_identifier),
                format!("'{}' is not a renderbuffer", renderbuffer_identifier.text),
            );
            return false;
        };
        let mut found_errors = false;
        if *rectangle_width == 0 {
            self.messages.error(
                Some(rectangle_width_token),
                "width of rectangle must be positive",
            );
            found_errors = true;
        }
        if *rectangle_height == 0 {
            self.messages.error(
                Some(rectangle_height_token),
                "height of rectangle must be positive",
            );
            found_errors = true;
        }
        let width_plus_x = *rectangle_width as u64 + *rectangle_x as u64;
        if width_plus_x > width as u64 {
            self.messages.error(
                Some(rectangle_width_token),
                format!(
                    "rectangle extends to x-coordinate {}, which exceeds width {} of '{}'",
                    width_plus_x, width, renderbuffer_identifier.text
                ),
            );
            found_errors = true;
        }
        let height_plus_y = *rectangle_height as u64 + *rectangle_y as u64;
        if height_plus_y > height as u64 {
            self.messages.error(
                Some(rectangle_height_token),
                format!(
                    "rectangle extends to y-coordinate {}, which exceeds height {} of '{}'",
                    height_plus_y, height, renderbuffer_identifier.text
                ),
            );
            found_errors = true;
        }
        !found_errors
    }

    fn visit_assert_similar_emd_histogram(&mut self, command: &'p Command) -> bool {
        let Command::AssertSimilarEmdHistogram {
            renderbuffer_identifier_1,
            renderbuffer_identifier_2,
            ..
        } = command
        else {
            return true;
        };
        let mut both_present = true;
        for operand in [renderbuffer_identifier_1, renderbuffer_identifier_2] {
            if !self.created_renderbuffers.contains_key(operand.text.as_str()) {
                self.messages.error(
                    Some(operand),
                    format!("'{}' must be a renderbuffer", operand.text),
                );
                both_present = false;
            }
        }
        if !both_present {
            return false;
        }
        self.check_renderbuffer_dimensions_match(renderbuffer_identifier_1, renderbuffer_identifier_2)
    }

    fn visit_compile_shader(&mut self, command: &'p Command) -> bool {
        let Command::CompileShader {
            result_identifier,
            shader_identifier,
            ..
        } = command
        else {
            return true;
        };
        if !self.check_identifier_is_fresh(result_identifier) {
            return false;
        }
        if !self
            .declared_shaders
            .contains_key(shader_identifier.text.as_str())
        {
            self.messages.error(
                Some(shader_identifier),
                format!(
                    "Identifier '{}' does not correspond to a declared shader",
                    shader_identifier.text
                ),
            );
            return false;
        }
        self.compiled_shaders
            .insert(&result_identifier.text, &shader_identifier.text);
        true
    }

    fn visit_create_buffer(&mut self, command: &'p Command) -> bool {
        let Command::CreateBuffer {
            result_identifier,
            size_bytes,
            ..
        } = command
        else {
            return true;
        };
        if !self.check_identifier_is_fresh(result_identifier) {
            return false;
        }
        self.created_buffers
            .insert(&result_identifier.text, (command.start_token(), *size_bytes));
        true
    }

    fn visit_create_empty_texture_2d(&mut self, command: &'p Command) -> bool {
        let Command::CreateEmptyTexture2d {
            result_identifier, ..
        } = command
        else {
            return true;
        };
        if !self.check_identifier_is_fresh(result_identifier) {
            return false;
        }
        self.created_textures.insert(&result_identifier.text);
        true
    }

    fn visit_create_program(&mut self, command: &'p Command) -> bool {
        let Command::CreateProgram {
            start_token,
            result_identifier,
            compiled_shader_identifiers,
        } = command
        else {
            return true;
        };
        let mut result = true;
        if !self.check_identifier_is_fresh(result_identifier) {
            result = false;
        } else {
            self.created_programs
                .insert(&result_identifier.text, compiled_shader_identifiers.len());
        }
        let mut compiled_vert_shader: Option<&Token> = None;
        let mut compiled_frag_shader: Option<&Token> = None;
        let mut compiled_comp_shader: Option<&Token> = None;
        for compiled_shader_identifier in compiled_shader_identifiers {
            let kind = self
                .compiled_shaders
                .get(compiled_shader_identifier.text.as_str())
                .and_then(|shader| self.declared_shaders.get(shader));
            let Some(kind) = kind else {
                self.messages.error(
                    Some(compiled_shader_identifier),
                    format!(
                        "Identifier '{}' does not correspond to a compiled shader",
                        compiled_shader_identifier.text
                    ),
                );
                result = false;
                continue;
            };
            let slot = match kind {
                ShaderKind::Vertex => &mut compiled_vert_shader,
                ShaderKind::Fragment => &mut compiled_frag_shader,
                ShaderKind::Compute => &mut compiled_comp_shader,
            };
            if let Some(previous) = slot {
                self.messages.error(
                    Some(compiled_shader_identifier),
                    format!(
                        "Multiple {} shaders provided to 'CREATE_PROGRAM'; already found '{}' \
                         at {}",
                        kind.describe(),
                        previous.text,
                        previous.location
                    ),
                );
                result = false;
            } else {
                *slot = Some(compiled_shader_identifier);
            }
        }
        if let Some(compute) = compiled_comp_shader {
            for (kind, shader) in [
                (ShaderKind::Fragment, compiled_frag_shader),
                (ShaderKind::Vertex, compiled_vert_shader),
            ] {
                if let Some(shader) = shader {
                    self.messages.error(
                        Some(compute),
                        format!(
                            "A compute shader cannot be used in 'CREATE_PROGRAM' with another \
                             kind of shader; found {} shader '{}' at {}",
                            kind.describe(),
                            shader.text,
                            shader.location
                        ),
                    );
                    result = false;
                }
            }
        } else {
            if compiled_frag_shader.is_none() {
                self.messages.error(
                    Some(start_token),
                    "No fragment shader provided for 'CREATE_PROGRAM' command",
                );
                result = false;
            }
            if compiled_vert_shader.is_none() {
                self.messages.error(
                    Some(start_token),
                    "No vertex shader provided for 'CREATE_PROGRAM' command",
                );
                result = false;
            }
        }
        result
    }

    fn visit_create_renderbuffer(&mut self, command: &'p Command) -> bool {
        let Command::CreateRenderbuffer {
            result_identifier,
            width,
            height,
            ..
        } = command
        else {
            return true;
        };
        if !self.check_identifier_is_fresh(result_identifier) {
            return false;
        }
        self.created_renderbuffers
            .insert(&result_identifier.text, (*width, *height));
        true
    }

    fn visit_create_sampler(&mut self, command: &'p Command) -> bool {
        let Command::CreateSampler {
            result_identifier, ..
        } = command
        else {
            return true;
        };
        if !self.check_identifier_is_fresh(result_identifier) {
            return false;
        }
        self.created_samplers.insert(&result_identifier.text);
        true
    }

    fn visit_declare_shader(&mut self, command: &'p Command) -> bool {
        let Command::DeclareShader {
            start_token,
            result_identifier,
            kind,
            ..
        } = command
        else {
            return true;
        };
        if !self.check_identifier_is_fresh(result_identifier) {
            return false;
        }
        if *kind == ShaderKind::Compute && !self.api_version.supports_compute_shaders() {
            self.messages.error(
                Some(start_token),
                "Compute shaders are not supported before OpenGL 4.3 or OpenGL ES 3.1",
            );
            return false;
        }
        self.declared_shaders.insert(&result_identifier.text, *kind);
        true
    }

    fn visit_dump_buffer_text(&mut self, command: &'p Command) -> bool {
        let Command::DumpBufferText {
            buffer_identifier,
            format_entries,
            ..
        } = command
        else {
            return true;
        };
        if !self.check_is_buffer(buffer_identifier) {
            return false;
        }
        let (declared_at, expected_bytes) = self.created_buffers[buffer_identifier.text.as_str()];
        self.check_format_entries(format_entries, &buffer_identifier.text, expected_bytes, declared_at)
    }

    fn visit_run_compute(&mut self, command: &'p Command) -> bool {
        let Command::RunCompute {
            program_identifier, ..
        } = command
        else {
            return true;
        };
        let Some(&num_shaders) = self.created_programs.get(program_identifier.text.as_str())
        else {
            self.messages.error(
                Some(program_identifier),
                format!("'{}' must be a program", program_identifier.text),
            );
            return false;
        };
        // A compute program holds exactly one shader; anything else was
        // linked from a vertex/fragment pair.
        if num_shaders != 1 {
            self.messages.error(
                Some(program_identifier),
                format!(
                    "'{}' must be a compute program, not a graphics program",
                    program_identifier.text
                ),
            );
            return false;
        }
        true
    }

    fn visit_run_graphics(&mut self, command: &'p Command) -> bool {
        let Command::RunGraphics {
            program_identifier,
            vertex_data,
            index_data_buffer_identifier,
            framebuffer_attachments,
            ..
        } = command
        else {
            return true;
        };
        let mut found_errors = false;
        match self.created_programs.get(program_identifier.text.as_str()) {
            None => {
                self.messages.error(
                    Some(program_identifier),
                    format!("'{}' must be a program", program_identifier.text),
                );
                found_errors = true;
            }
            Some(&num_shaders) if num_shaders != 2 => {
                self.messages.error(
                    Some(program_identifier),
                    format!(
                        "'{}' must be a graphics program, not a compute program",
                        program_identifier.text
                    ),
                );
                found_errors = true;
            }
            Some(_) => {}
        }
        for attribute in vertex_data.values() {
            if !self
                .created_buffers
                .contains_key(attribute.buffer_identifier.text.as_str())
            {
                self.messages.error(
                    Some(&attribute.buffer_identifier),
                    format!(
                        "vertex buffer '{}' must be a buffer",
                        attribute.buffer_identifier.text
                    ),
                );
                found_errors = true;
            }
        }
        if !self
            .created_buffers
            .contains_key(index_data_buffer_identifier.text.as_str())
        {
            self.messages.error(
                Some(index_data_buffer_identifier),
                format!(
                    "index buffer '{}' must be a buffer",
                    index_data_buffer_identifier.text
                ),
            );
            found_errors = true;
        }
        for (key, attachment) in framebuffer_attachments {
            if self.api_version.restricts_framebuffer_attachments_to_zero() && *key != 0 {
                self.messages.error(
                    Some(attachment),
                    "Only 0 may be used as a framebuffer attachment key when working with \
                     OpenGL ES 2.0",
                );
                found_errors = true;
            }
            if !self.created_renderbuffers.contains_key(attachment.text.as_str())
                && !self.created_textures.contains(attachment.text.as_str())
            {
                self.messages.error(
                    Some(attachment),
                    format!(
                        "framebuffer attachment '{}' must be a renderbuffer or texture",
                        attachment.text
                    ),
                );
                found_errors = true;
            }
        }
        !found_errors
    }

    fn check_is_buffer(&mut self, identifier: &Token) -> bool {
        if !self.created_buffers.contains_key(identifier.text.as_str()) {
            self.messages.error(
                Some(identifier),
                format!("'{}' must be a buffer", identifier.text),
            );
            return false;
        }
        true
    }

    fn check_is_sampler(&mut self, identifier: &Token) -> bool {
        if !self.created_samplers.contains(identifier.text.as_str()) {
            self.messages.error(
                Some(identifier),
                format!("'{}' must be a sampler", identifier.text),
            );
            return false;
        }
        true
    }

    fn check_is_texture(&mut self, identifier: &Token) -> bool {
        if !self.created_textures.contains(identifier.text.as_str()) {
            self.messages.error(
                Some(identifier),
                format!("'{}' must be a texture", identifier.text),
            );
            return false;
        }
        true
    }

    fn check_is_program(&mut self, identifier: &Token) -> bool {
        if !self.created_programs.contains_key(identifier.text.as_str()) {
            self.messages.error(
                Some(identifier),
                format!("'{}' must be a program", identifier.text),
            );
            return false;
        }
        true
    }

    fn check_is_renderbuffer(&mut self, identifier: &Token) -> bool {
        if !self.created_renderbuffers.contains_key(identifier.text.as_str()) {
            self.messages.error(
                Some(identifier),
                format!("'{}' must be a renderbuffer", identifier.text),
            );
            return false;
        }
        true
    }

    fn check_identifier_is_fresh(&mut self, identifier: &'p Token) -> bool {
        if let Some(previous) = self.used_identifiers.get(identifier.text.as_str()) {
            self.messages.error(
                Some(identifier),
                format!(
                    "Identifier '{}' already used at {}",
                    identifier.text, previous.location
                ),
            );
            return false;
        }
        self.used_identifiers.insert(&identifier.text, identifier);
        true
    }

    fn check_renderbuffer_dimensions_match(&mut self, token_1: &Token, token_2: &Token) -> bool {
        let (width_1, height_1) = self.created_renderbuffers[token_1.text.as_str()];
        let (width_2, height_2) = self.created_renderbuffers[token_2.text.as_str()];
        let mut result = true;
        if width_1 != width_2 {
            self.messages.error(
                Some(token_2),
                format!(
                    "width {} of '{}' does not match width {} of '{}' at {}",
                    width_2, token_2.text, width_1, token_1.text, token_1.location
                ),
            );
            result = false;
        }
        if height_1 != height_2 {
            self.messages.error(
                Some(token_2),
                format!(
                    "height {} of '{}' does not match height {} of '{}' at {}",
                    height_2, token_2.text, height_1, token_1.text, token_1.location
                ),
            );
            result = false;
        }
        result
    }

    fn check_format_entries(
        &mut self,
        format_entries: &[FormatEntry],
        display_name: &str,
        expected_bytes: u32,
        declared_at: &Token,
    ) -> bool {
        let mut found_errors = false;
        let mut total_count_bytes = 0u64;
        for format_entry in format_entries {
            match format_entry.kind {
                FormatEntryKind::Literal => {}
                FormatEntryKind::Byte | FormatEntryKind::Skip => {
                    if format_entry.count == 0 {
                        self.messages.error(
                            Some(&format_entry.token),
                            "The count for a formatting entry must be positive",
                        );
                        found_errors = true;
                    }
                    if format_entry.count % 4 != 0 {
                        let keyword = if format_entry.kind == FormatEntryKind::Byte {
                            keyword_to_string(TokenType::TypeByte)
                        } else {
                            keyword_to_string(TokenType::SkipBytes)
                        };
                        self.messages.error(
                            Some(&format_entry.token),
                            format!(
                                "The count for a '{}' formatting entry must be a multiple of 4; \
                                 found {}",
                                keyword, format_entry.count
                            ),
                        );
                        found_errors = true;
                    }
                    total_count_bytes += format_entry.count as u64;
                }
                FormatEntryKind::Float | FormatEntryKind::Int | FormatEntryKind::Uint => {
                    if format_entry.count == 0 {
                        self.messages.error(
                            Some(&format_entry.token),
                            "The count for a formatting entry must be positive",
                        );
                        found_errors = true;
                    }
                    total_count_bytes += format_entry.count as u64 * 4;
                }
            }
        }
        if format_entries.is_empty() {
            return !found_errors;
        }
        if total_count_bytes != expected_bytes as u64 {
            self.messages.error(
                Some(&format_entries[0].token),
                format!(
                    "The number of bytes specified in the formatting of '{}' is {}, but '{}' \
                     was declared with size {} byte{} at {}",
                    display_name,
                    total_count_bytes,
                    display_name,
                    expected_bytes,
                    if expected_bytes > 1 { "s" } else { "" },
                    declared_at.location
                ),
            );
            found_errors = true;
        }
        !found_errors
    }
}

#[cfg(test)]
mod tests {
    use super::super::message::MessageLog;
    use super::super::parser::Parser;
    use super::check;

    fn parse_and_check(script: &str) -> (bool, MessageLog) {
        let mut log = MessageLog::new();
        let program = Parser::new(script, &mut log)
            .parse()
            .expect("script should parse");
        let result = check(&program, &mut log);
        (result, log)
    }

    fn messages(log: &MessageLog) -> Vec<String> {
        (0..log.len()).map(|i| log.message_string(i)).collect()
    }

    #[test]
    fn redeclaring_a_shader_identifier_is_reported_once() {
        let script = "DECLARE_SHADER s VERTEX\n\
                      #version 320 es\n\
                      void main() { }\n\
                      END\n\
                      \n\
                      DECLARE_SHADER s VERTEX\n\
                      #version 320 es\n\
                      void main() { }\n\
                      END\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 6:16: Identifier 's' already used at 1:16"
        );
    }

    #[test]
    fn identifiers_share_one_namespace_across_kinds() {
        let script = "CREATE_BUFFER thing SIZE_BYTES 4 INIT_VALUES int 1\n\
                      CREATE_SAMPLER thing\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 2:16: Identifier 'thing' already used at 1:15"
        );
    }

    #[test]
    fn compiling_an_undeclared_shader_fails() {
        let (result, log) = parse_and_check("COMPILE_SHADER result SHADER nonexistent\n");
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 1:30: Identifier 'nonexistent' does not correspond to a declared shader"
        );
    }

    #[test]
    fn create_program_requires_a_vertex_shader() {
        let script = "DECLARE_SHADER frag FRAGMENT\n\
                      void main() { }\n\
                      END\n\
                      COMPILE_SHADER frag_compiled SHADER frag\n\
                      CREATE_PROGRAM prog SHADERS frag_compiled\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 5:1: No vertex shader provided for 'CREATE_PROGRAM' command"
        );
    }

    #[test]
    fn create_program_requires_a_fragment_shader() {
        let script = "DECLARE_SHADER vert VERTEX\n\
                      void main() { }\n\
                      END\n\
                      COMPILE_SHADER vert_compiled SHADER vert\n\
                      CREATE_PROGRAM prog SHADERS vert_compiled\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 5:1: No fragment shader provided for 'CREATE_PROGRAM' command"
        );
    }

    #[test]
    fn create_program_rejects_duplicate_fragment_shaders() {
        let script = "DECLARE_SHADER frag FRAGMENT\n\
                      void main() { }\n\
                      END\n\
                      DECLARE_SHADER vert VERTEX\n\
                      void main() { }\n\
                      END\n\
                      COMPILE_SHADER frag_compiled SHADER frag\n\
                      COMPILE_SHADER frag_compiled2 SHADER frag\n\
                      COMPILE_SHADER vert_compiled SHADER vert\n\
                      CREATE_PROGRAM prog SHADERS vert_compiled frag_compiled frag_compiled2\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 10:57: Multiple fragment shaders provided to 'CREATE_PROGRAM'; already \
             found 'frag_compiled' at 10:43"
        );
    }

    #[test]
    fn create_program_rejects_compute_with_fragment() {
        let script = "DECLARE_SHADER frag FRAGMENT\n\
                      void main() { }\n\
                      END\n\
                      DECLARE_SHADER comp COMPUTE\n\
                      void main() { }\n\
                      END\n\
                      COMPILE_SHADER frag_compiled SHADER frag\n\
                      COMPILE_SHADER comp_compiled SHADER comp\n\
                      CREATE_PROGRAM prog SHADERS comp_compiled frag_compiled\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 9:29: A compute shader cannot be used in 'CREATE_PROGRAM' with another \
             kind of shader; found fragment shader 'frag_compiled' at 9:43"
        );
    }

    #[test]
    fn create_program_rejects_uncompiled_references() {
        let script = "DECLARE_SHADER frag FRAGMENT\n\
                      void main() { }\n\
                      END\n\
                      CREATE_PROGRAM prog SHADERS frag\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        // The declared-but-not-compiled reference plus the two missing
        // stages.
        let all = messages(&log);
        assert!(all[0].contains("Identifier 'frag' does not correspond to a compiled shader"));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn compute_shaders_need_a_recent_api() {
        let script = "GLES 3.0\n\
                      DECLARE_SHADER comp COMPUTE\n\
                      void main() { }\n\
                      END\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(
            log.message_string(0),
            "ERROR: 2:1: Compute shaders are not supported before OpenGL 4.3 or OpenGL ES 3.1"
        );
    }

    #[test]
    fn assert_equal_buffer_sizes_must_match() {
        let script = "CREATE_BUFFER b1 SIZE_BYTES 8 INIT_VALUES int 1 2\n\
                      CREATE_BUFFER b2 SIZE_BYTES 4 INIT_VALUES int 1\n\
                      ASSERT_EQUAL BUFFERS b1 b2\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 3:25: size (in bytes) 4 of 'b2' does not match size (in bytes) 8 of 'b1' \
             at 3:22"
        );
    }

    #[test]
    fn assert_equal_renderbuffer_dimensions_must_match() {
        let script = "CREATE_RENDERBUFFER rb1 WIDTH 16 HEIGHT 16\n\
                      CREATE_RENDERBUFFER rb2 WIDTH 8 HEIGHT 16\n\
                      ASSERT_EQUAL RENDERBUFFERS rb1 rb2\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 3:32: width 8 of 'rb2' does not match width 16 of 'rb1' at 3:28"
        );
    }

    #[test]
    fn assert_equal_mixed_operand_kinds_fail() {
        let script = "CREATE_BUFFER buf SIZE_BYTES 4 INIT_VALUES int 1\n\
                      CREATE_RENDERBUFFER rb WIDTH 4 HEIGHT 4\n\
                      ASSERT_EQUAL BUFFERS buf rb\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert!(log.message_string(0).contains("'rb' must be a buffer"));
    }

    #[test]
    fn assert_pixels_rectangle_must_stay_in_bounds() {
        let script = "CREATE_RENDERBUFFER rb WIDTH 16 HEIGHT 16\n\
                      ASSERT_PIXELS RENDERBUFFER rb RECTANGLE 8 0 12 16 EXPECTED 255 0 0 255\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 2:45: rectangle extends to x-coordinate 20, which exceeds width 16 of 'rb'"
        );
    }

    #[test]
    fn assert_pixels_rectangle_must_be_nonempty() {
        let script = "CREATE_RENDERBUFFER rb WIDTH 16 HEIGHT 16\n\
                      ASSERT_PIXELS RENDERBUFFER rb RECTANGLE 0 0 0 16 EXPECTED 255 0 0 255\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert!(log.message_string(0).contains("width of rectangle must be positive"));
    }

    #[test]
    fn binding_resources_that_do_not_exist_fails() {
        let script = "BIND_SAMPLER SAMPLER s TEXTURE_UNIT 0\n\
                      BIND_TEXTURE TEXTURE t TEXTURE_UNIT 1\n\
                      BIND_UNIFORM_BUFFER BUFFER b BINDING 0\n\
                      BIND_SHADER_STORAGE_BUFFER BUFFER b2 BINDING 1\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        let all = messages(&log);
        assert_eq!(all.len(), 4);
        assert!(all[0].contains("'s' must be a sampler"));
        assert!(all[1].contains("'t' must be a texture"));
        assert!(all[2].contains("'b' must be a buffer"));
        assert!(all[3].contains("'b2' must be a buffer"));
    }

    #[test]
    fn run_compute_rejects_a_graphics_program() {
        let script = "DECLARE_SHADER frag FRAGMENT\n\
                      void main() { }\n\
                      END\n\
                      DECLARE_SHADER vert VERTEX\n\
                      void main() { }\n\
                      END\n\
                      COMPILE_SHADER frag_compiled SHADER frag\n\
                      COMPILE_SHADER vert_compiled SHADER vert\n\
                      CREATE_PROGRAM prog SHADERS vert_compiled frag_compiled\n\
                      RUN_COMPUTE PROGRAM prog NUM_GROUPS 1 1 1\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 10:21: 'prog' must be a compute program, not a graphics program"
        );
    }

    #[test]
    fn gles2_only_allows_attachment_key_zero() {
        let script = "GLES 2.0\n\
                      RUN_GRAPHICS PROGRAM prog VERTEX_DATA [ ] INDEX_DATA ibuf VERTEX_COUNT 3 \
                      TOPOLOGY TRIANGLES FRAMEBUFFER_ATTACHMENTS [ 1 -> rb ]\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        let all = messages(&log);
        assert!(all.iter().any(|message| message.contains(
            "Only 0 may be used as a framebuffer attachment key when working with OpenGL ES 2.0"
        )));
    }

    #[test]
    fn dump_buffer_text_formatting_must_cover_the_buffer() {
        let script = "CREATE_BUFFER buf SIZE_BYTES 8 INIT_VALUES int 1 2\n\
                      DUMP_BUFFER_TEXT BUFFER buf FILE \"out.txt\" FORMAT int 1\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 1);
        assert_eq!(
            log.message_string(0),
            "ERROR: 2:51: The number of bytes specified in the formatting of 'buf' is 4, but \
             'buf' was declared with size 8 bytes at 1:1"
        );
    }

    #[test]
    fn a_complete_graphics_script_passes() {
        let script = "GLES 3.2\n\
                      DECLARE_SHADER vert VERTEX\n\
                      void main() { }\n\
                      END\n\
                      DECLARE_SHADER frag FRAGMENT\n\
                      void main() { }\n\
                      END\n\
                      COMPILE_SHADER vert_compiled SHADER vert\n\
                      COMPILE_SHADER frag_compiled SHADER frag\n\
                      CREATE_PROGRAM prog SHADERS vert_compiled frag_compiled\n\
                      CREATE_BUFFER vbuf SIZE_BYTES 8 INIT_VALUES float 0.0 1.0\n\
                      CREATE_BUFFER ibuf SIZE_BYTES 4 INIT_VALUES uint 0\n\
                      CREATE_RENDERBUFFER rb WIDTH 16 HEIGHT 16\n\
                      RUN_GRAPHICS PROGRAM prog VERTEX_DATA [ 0 -> BUFFER vbuf OFFSET_BYTES 0 \
                      STRIDE_BYTES 8 DIMENSION 2 ] INDEX_DATA ibuf VERTEX_COUNT 1 TOPOLOGY \
                      TRIANGLES FRAMEBUFFER_ATTACHMENTS [ 0 -> rb ]\n\
                      ASSERT_PIXELS RENDERBUFFER rb RECTANGLE 0 0 16 16 EXPECTED 0 0 0 0\n\
                      DUMP_RENDERBUFFER RENDERBUFFER rb FILE \"out.png\"\n";
        let (result, log) = parse_and_check(script);
        assert!(result, "{:?}", messages(&log));
        assert!(log.is_empty());
    }

    #[test]
    fn a_complete_compute_script_passes() {
        let script = "DECLARE_SHADER comp COMPUTE\n\
                      void main() { }\n\
                      END\n\
                      COMPILE_SHADER comp_compiled SHADER comp\n\
                      CREATE_PROGRAM prog SHADERS comp_compiled\n\
                      CREATE_BUFFER buf SIZE_BYTES 4 INIT_VALUES uint 0\n\
                      BIND_SHADER_STORAGE_BUFFER BUFFER buf BINDING 0\n\
                      RUN_COMPUTE PROGRAM prog NUM_GROUPS 4 1 1\n\
                      DUMP_BUFFER_BINARY BUFFER buf FILE \"out.bin\"\n";
        let (result, log) = parse_and_check(script);
        assert!(result, "{:?}", messages(&log));
        assert!(log.is_empty());
    }

    #[test]
    fn checker_continues_past_failures() {
        let script = "BIND_SAMPLER SAMPLER s TEXTURE_UNIT 0\n\
                      SET_UNIFORM PROGRAM p LOCATION 0 TYPE float VALUES 1.0\n\
                      DUMP_RENDERBUFFER RENDERBUFFER rb FILE \"out.png\"\n";
        let (result, log) = parse_and_check(script);
        assert!(!result);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn rerunning_gives_identical_diagnostics() {
        let script = "CREATE_SAMPLER s\n\
                      CREATE_SAMPLER s\n\
                      BIND_SAMPLER SAMPLER missing TEXTURE_UNIT 0\n";
        let (first_result, first_log) = parse_and_check(script);
        let (second_result, second_log) = parse_and_check(script);
        assert_eq!(first_result, second_result);
        assert_eq!(messages(&first_log), messages(&second_log));
        assert_eq!(first_log.len(), 2);
    }
}
