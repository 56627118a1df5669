use std::fmt;

/// The argv handed to the process layer.
///
/// Built fresh for every run and never mutated afterwards; nothing in it is
/// quoted or escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandVector {
    args: Vec<String>,
}

impl CommandVector {
    pub fn new(args: Vec<String>) -> Self {
        Self { args }
    }

    pub fn program(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Arguments after the program
    pub fn args(&self) -> &[String] {
        self.args.get(1..).unwrap_or(&[])
    }

    pub fn as_slice(&self) -> &[String] {
        &self.args
    }

    /// Human readable rendering, for logs and dry runs only
    pub fn to_shell_command(&self) -> String {
        let mut cmd = String::new();
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                cmd.push(' ');
            }
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                cmd.push_str(&format!("'{arg}'"));
            } else {
                cmd.push_str(arg);
            }
        }
        cmd
    }
}

impl fmt::Display for CommandVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_command())
    }
}
