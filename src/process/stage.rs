/// One program invocation within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    program: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl Stage {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Bindings applied on top of the merged shell environment for this stage only.
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// The stage as a line the shell would parse back into the same words.
    pub fn describe(&self) -> String {
        let mut words: Vec<&str> = Vec::with_capacity(self.args.len() + 1);
        words.push(&self.program);
        words.extend(self.args.iter().map(String::as_str));
        // Only words containing NUL cannot be quoted.
        shlex::try_join(words.iter().copied()).unwrap_or_else(|_| words.join(" "))
    }
}
