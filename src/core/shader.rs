//! Shader "compiler" for the software backend.
//!
//! There is no GLSL front end here. A shader is accepted when it has the shape
//! of the constant pipelines the triangle scene uses: a vertex stage that
//! forwards an attribute to `gl_Position`, and a fragment stage that writes a
//! literal `vec4` to `gl_FragColor`. The literal becomes the fill color.

use crate::gl::{Rgba, ShaderStage};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum CompiledShader {
    Vertex,
    Fragment { color: Rgba },
}

pub(crate) fn compile(stage: ShaderStage, source: &str) -> Result<CompiledShader, String> {
    let code = normalize(source);
    if code.is_empty() {
        return Err("ERROR: empty shader source".to_string());
    }
    if !code.contains("void main(") && !code.contains("void main (") {
        return Err("ERROR: 'main' : function not defined".to_string());
    }

    match stage {
        ShaderStage::Vertex => {
            assignment_rhs(&code, "gl_Position")
                .ok_or_else(|| "ERROR: vertex shader never writes gl_Position".to_string())?;
            Ok(CompiledShader::Vertex)
        }
        ShaderStage::Fragment => {
            let rhs = assignment_rhs(&code, "gl_FragColor")
                .ok_or_else(|| "ERROR: fragment shader never writes gl_FragColor".to_string())?;
            let color = parse_vec4_literal(rhs).ok_or_else(|| {
                "ERROR: gl_FragColor must be assigned a constant vec4(r, g, b, a)".to_string()
            })?;
            Ok(CompiledShader::Fragment { color })
        }
    }
}

/// Strip `//` comments and collapse whitespace runs into single spaces.
fn normalize(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for line in source.lines() {
        let code = match line.find("//") {
            Some(i) => &line[..i],
            None => line,
        };
        for word in code.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// Text following `<target> =` (not `==`), if the target is ever assigned.
fn assignment_rhs<'a>(code: &'a str, target: &str) -> Option<&'a str> {
    let mut rest = code;
    while let Some(i) = rest.find(target) {
        let after = rest[i + target.len()..].trim_start();
        if let Some(rhs) = after.strip_prefix('=') {
            if !rhs.starts_with('=') {
                return Some(rhs.trim_start());
            }
        }
        rest = &rest[i + target.len()..];
    }
    None
}

fn parse_vec4_literal(rhs: &str) -> Option<Rgba> {
    let args = rhs.strip_prefix("vec4")?.trim_start().strip_prefix('(')?;
    let close = args.find(')')?;
    let mut parts = args[..close].split(',').map(|p| p.trim().parse::<f32>());
    let r = parts.next()?.ok()?;
    let g = parts.next()?.ok()?;
    let b = parts.next()?.ok()?;
    let a = parts.next()?.ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Rgba::new(r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_literal_becomes_fill_color() {
        let src = "void main() {\n  // solid\n  gl_FragColor = vec4(0.0, 0.5, 1.0, 1.0);\n}";
        assert_eq!(
            compile(ShaderStage::Fragment, src),
            Ok(CompiledShader::Fragment {
                color: Rgba::new(0.0, 0.5, 1.0, 1.0)
            })
        );
    }

    #[test]
    fn vertex_requires_position_write() {
        let ok = "attribute vec4 position;\nvoid main() { gl_Position = position; }";
        assert_eq!(compile(ShaderStage::Vertex, ok), Ok(CompiledShader::Vertex));

        let missing = "attribute vec4 position;\nvoid main() { }";
        let err = compile(ShaderStage::Vertex, missing).unwrap_err();
        assert!(err.contains("gl_Position"));
    }

    #[test]
    fn rejects_missing_main_and_non_constant_color() {
        assert!(compile(ShaderStage::Fragment, "gl_FragColor = vec4(1.0,0.0,0.0,1.0);")
            .unwrap_err()
            .contains("main"));

        let varying = "varying vec4 c;\nvoid main() { gl_FragColor = c; }";
        assert!(compile(ShaderStage::Fragment, varying)
            .unwrap_err()
            .contains("constant vec4"));
    }

    #[test]
    fn comparison_is_not_an_assignment() {
        assert_eq!(assignment_rhs("if (gl_Position == x) gl_Position = y;", "gl_Position"), Some("y;"));
        assert_eq!(assignment_rhs("gl_Position == x", "gl_Position"), None);
    }
}
