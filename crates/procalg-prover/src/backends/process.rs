use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};

use procalg_data::DataExpr;
use tracing::{debug, trace};

use crate::error::SmtError;
use crate::oracle::SmtOracle;
use crate::smtlib::SmtLibBenchmark;

/// The solvers the process oracle knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverKind {
    Z3,
    Cvc5,
}

impl SolverKind {
    pub fn command(self) -> &'static str {
        match self {
            SolverKind::Z3 => "z3",
            SolverKind::Cvc5 => "cvc5",
        }
    }

    fn arguments(self) -> &'static [&'static str] {
        match self {
            SolverKind::Z3 => &["-in", "-smt2"],
            SolverKind::Cvc5 => &["--lang", "smt2", "--incremental"],
        }
    }
}

/// An SMT solver running as a child process, fed SMT-LIB 2 over stdin.
/// Every query runs in its own assertion scope.
pub struct ProcessOracle {
    kind: SolverKind,
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    stderr: BufReader<ChildStderr>,
    queries: usize,
}

impl ProcessOracle {
    pub fn new(kind: SolverKind) -> Result<Self, SmtError> {
        Self::with_command(kind, kind.command())
    }

    /// Start `cmd` with the arguments of `kind`, for solvers that are not
    /// on PATH under their usual name.
    pub fn with_command(kind: SolverKind, cmd: &str) -> Result<Self, SmtError> {
        let mut child = Command::new(cmd)
            .args(kind.arguments())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SmtError::NotFound {
                command: cmd.to_string(),
                reason: e.to_string(),
            })?;

        let missing = |pipe: &str| SmtError::NotFound {
            command: cmd.to_string(),
            reason: format!("failed to capture {pipe}"),
        };
        let stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
        let stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
        let stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

        let mut oracle = Self {
            kind,
            child,
            stdin,
            stdout: BufReader::new(stdout),
            stderr: BufReader::new(stderr),
            queries: 0,
        };
        oracle.send("(set-option :print-success false)")?;
        oracle.send("(set-logic ALL)")?;
        debug!(solver = cmd, "started SMT solver");
        Ok(oracle)
    }

    pub fn kind(&self) -> SolverKind {
        self.kind
    }

    /// Queries answered so far.
    pub fn queries(&self) -> usize {
        self.queries
    }

    fn send(&mut self, cmd: &str) -> Result<(), SmtError> {
        trace!(cmd, "smt <");
        writeln!(self.stdin, "{cmd}")?;
        Ok(())
    }

    fn ask(&mut self, cmd: &str) -> Result<String, SmtError> {
        self.send(cmd)?;
        self.stdin.flush()?;

        let mut response = String::new();
        self.stdout.read_line(&mut response)?;
        if response.is_empty() {
            let mut stderr = String::new();
            let _ = self.stderr.read_line(&mut stderr);
            return Err(SmtError::UnexpectedAnswer {
                command: cmd.to_string(),
                answer: format!("no response; stderr: {}", stderr.trim()),
            });
        }
        let response = response.trim_end().to_string();
        trace!(response = %response, "smt >");
        Ok(response)
    }
}

impl Drop for ProcessOracle {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "(exit)");
        let _ = self.stdin.flush();
        let _ = self.child.wait();
    }
}

impl SmtOracle for ProcessOracle {
    fn is_satisfiable(&mut self, guards: &[DataExpr]) -> Result<bool, SmtError> {
        let benchmark = SmtLibBenchmark::new(guards)?;
        self.send("(push 1)")?;
        for c in benchmark.commands() {
            self.send(&c)?;
        }
        let answer = self.ask("(check-sat)")?;
        self.send("(pop 1)")?;
        self.queries += 1;
        match answer.as_str() {
            "sat" | "unknown" => Ok(true),
            "unsat" => Ok(false),
            _ => Err(SmtError::UnexpectedAnswer {
                command: "(check-sat)".to_string(),
                answer,
            }),
        }
    }
}
