use std::{fs, path::PathBuf};

use clap::Parser as ClapParser;
use kern_resolve::{install_polyfills, DeclareFunction, FunctionDecl, FunctionNode, SourceBackend, Ty, KERNEL_ENTRY};
use termcolor::{ColorChoice, ColorSpec, StandardStream, WriteColor};

pub mod error {
    use thiserror::Error;
    #[derive(Error, Debug)]
    pub enum KernError {
        #[error(transparent)]
        Io(#[from] std::io::Error),
        #[error(transparent)]
        Analysis(#[from] kern_resolve::AnalysisError),
        #[error(transparent)]
        Registry(#[from] kern_resolve::RegistryError),
        #[error("malformed function declaration: {0}")]
        MalformedDeclaration(String),
    }
}

#[derive(ClapParser)]
#[command(version = "0.0", author = "Alex H <alex@alex-hansen.com>")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapParser)]
enum Commands {
    #[command(about = "Trace the functions a kernel transitively calls")]
    Trace {
        #[arg(help = "Path to the kernel source file")]
        path:         PathBuf,
        #[arg(short, long, help = "Entry function to trace from", default_value = KERNEL_ENTRY)]
        entry:        String,
        #[arg(long, help = "Skip installing the standard polyfills")]
        no_polyfills: bool,
        #[arg(short, long, help = "Print each function's recorded caller")]
        parents:      bool,
    },
    #[command(about = "List the functions declared in a source file")]
    Ls {
        #[arg(help = "Path to the kernel source file")]
        path: PathBuf,
    },
}

fn main() -> Result<(), error::KernError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Trace {
            path,
            entry,
            no_polyfills,
            parents,
        } => {
            let source = fs::read_to_string(&path)?;
            let mut backend = SourceBackend::new();
            // polyfills go in first so a user-defined function of the same
            // name replaces the synthetic one
            if !no_polyfills {
                install_polyfills(&mut backend)?;
            }
            declare_source(&mut backend, &source)?;

            let mut registry = backend.into_registry();
            let traced = registry.trace(&entry)?;

            let mut stdout = StandardStream::stdout(ColorChoice::Always);
            stdout.set_color(ColorSpec::new().set_bold(true))?;
            println!(
                "{} {} reachable from {}",
                traced.len(),
                if traced.len() == 1 { "function" } else { "functions" },
                entry
            );
            stdout.set_color(ColorSpec::new().set_bold(false))?;

            for name in &traced {
                if parents {
                    let id = registry.lookup(name).expect("traced names are always registered");
                    match registry.parent(id) {
                        Some(parent) => println!("{} (called from {})", name, registry.get(parent).function_name()),
                        None => println!("{} (entry)", name),
                    }
                } else {
                    println!("{}", name);
                }
            }
        },
        Commands::Ls { path } => {
            let source = fs::read_to_string(&path)?;
            for decl in split_declarations(&source)? {
                println!("{}", decl.name);
            }
        },
    }
    Ok(())
}

struct Declaration {
    name:   String,
    body:   String,
    params: usize,
}

/// Register every declaration in `source` through the backend. A function
/// named `kernel` becomes the root kernel; parameter and return types
/// default to float, as kernel sources don't annotate them.
fn declare_source(
    backend: &mut SourceBackend,
    source: &str,
) -> Result<(), error::KernError> {
    for decl in split_declarations(source)? {
        let param_types = vec![Ty::Float; decl.params];
        let function = FunctionDecl {
            name:        &decl.name,
            body:        &decl.body,
            param_types: &param_types,
            return_type: Ty::Float,
        };
        if decl.name == KERNEL_ENTRY {
            backend.add_kernel(function);
        } else {
            backend.declare(function)?;
        }
    }
    Ok(())
}

/// Split `source` into `fn name(params) { body }` declarations. Bodies are
/// brace-matched; anything between declarations is ignored.
fn split_declarations(source: &str) -> Result<Vec<Declaration>, error::KernError> {
    let mut decls = Vec::new();
    let mut rest = source;
    while let Some(found) = rest.find("fn ") {
        let at_boundary = found == 0 || matches!(rest.as_bytes()[found - 1], b' ' | b'\t' | b'\n' | b'\r' | b'}' | b';');
        if !at_boundary {
            rest = &rest[found + 3..];
            continue;
        }

        let after = rest[found + 3..].trim_start();
        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let name = &after[..name_len];
        if name.is_empty() {
            return Err(error::KernError::MalformedDeclaration("missing function name".into()));
        }

        let after_name = after[name_len..].trim_start();
        let Some(param_list) = after_name.strip_prefix('(') else {
            return Err(error::KernError::MalformedDeclaration(format!(
                "expected parameter list after `{name}`"
            )));
        };
        let Some(params_end) = param_list.find(')') else {
            return Err(error::KernError::MalformedDeclaration(format!(
                "unclosed parameter list in `{name}`"
            )));
        };
        let params = param_list[..params_end].split(',').filter(|p| !p.trim().is_empty()).count();

        let after_params = param_list[params_end + 1..].trim_start();
        let Some(body_and_rest) = after_params.strip_prefix('{') else {
            return Err(error::KernError::MalformedDeclaration(format!("expected body after `{name}`")));
        };
        let body_len = matching_brace(body_and_rest)
            .ok_or_else(|| error::KernError::MalformedDeclaration(format!("unbalanced braces in `{name}`")))?;

        decls.push(Declaration {
            name:   name.to_string(),
            body:   body_and_rest[..body_len].to_string(),
            params,
        });
        rest = &body_and_rest[body_len + 1..];
    }
    Ok(decls)
}

/// Byte offset of the `}` matching an already-consumed `{`.
fn matching_brace(s: &str) -> Option<usize> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            },
            _ => {},
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_brace_matched_declarations() {
        let decls = split_declarations("fn kernel(a) { return scale(a); }\nfn scale(v) { return v * 2.0; }")
            .expect("source should split");
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["kernel", "scale"]);
        assert_eq!(decls[0].params, 1);
        assert!(decls[0].body.contains("scale(a)"));
    }

    #[test]
    fn nested_braces_stay_in_one_body() {
        let decls = split_declarations("fn kernel(a) { if (a > 0.0) { return pick(a); } return 0.0; }")
            .expect("source should split");
        assert_eq!(decls.len(), 1);
        assert!(decls[0].body.contains("pick(a)"));
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        assert!(split_declarations("fn kernel(a) { return a;").is_err());
    }
}
