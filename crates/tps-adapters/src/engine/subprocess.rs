use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Engine;
use crate::errors::EngineError;

/// Trabajo para una propuesta concreta.
#[derive(Debug, Clone)]
pub struct EngineJob {
    pub chain_index: usize,
    pub step_number: u64,
    /// Enviado por stdin (p. ej. el step actual en JSON).
    pub input: String,
}

#[derive(Debug, Clone)]
pub struct EngineOutput {
    pub stdout: String,
    pub workdir: PathBuf,
}

/// Engine que lanza un proceso por trabajo.
///
/// Los argumentos admiten `{chain}`, `{step}` y `{workdir}`; el workdir de
/// cada trabajo es `<root>/chain_<i>/step_<n>`.
#[derive(Debug, Clone)]
pub struct SubprocessEngine {
    program: String,
    args: Vec<String>,
    workdir_root: PathBuf,
    timeout: Duration,
}

impl SubprocessEngine {
    pub fn new(program: impl Into<String>, workdir_root: impl Into<PathBuf>) -> Self {
        Self { program: program.into(),
               args: Vec::new(),
               workdir_root: workdir_root.into(),
               timeout: Duration::from_secs(3600) }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
        where I: IntoIterator<Item = S>,
              S: Into<String>
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn workdir_for(&self, chain_index: usize, step_number: u64) -> PathBuf {
        self.workdir_root
            .join(format!("chain_{chain_index}"))
            .join(format!("step_{step_number}"))
    }

    fn render_args(&self, job: &EngineJob, workdir: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| {
                a.replace("{chain}", &job.chain_index.to_string())
                 .replace("{step}", &job.step_number.to_string())
                 .replace("{workdir}", workdir)
            })
            .collect()
    }
}

#[async_trait]
impl Engine for SubprocessEngine {
    async fn run(&self, job: EngineJob) -> Result<EngineOutput, EngineError> {
        let workdir = self.workdir_for(job.chain_index, job.step_number);
        tokio::fs::create_dir_all(&workdir).await?;
        let args = self.render_args(&job, &workdir.to_string_lossy());
        info!("engine:spawn chain={} step={} cmd={} {:?}",
              job.chain_index,
              job.step_number,
              self.program,
              args);

        let mut child = Command::new(&self.program).args(&args)
                                                   .current_dir(&workdir)
                                                   .stdin(Stdio::piped())
                                                   .stdout(Stdio::piped())
                                                   .stderr(Stdio::piped())
                                                   .kill_on_drop(true)
                                                   .spawn()
                                                   .map_err(|source| EngineError::Spawn { program: self.program.clone(),
                                                                                          source })?;
        // Escritura de stdin y espera bajo el mismo timeout: un hijo que no lee
        // stdin puede bloquear la escritura con el pipe lleno.
        let stdin = child.stdin.take();
        let input = job.input.as_bytes();
        let (chain_index, step_number) = (job.chain_index, job.step_number);
        let exchange = async move {
            if let Some(mut stdin) = stdin {
                // un proceso que no lee stdin no debe tumbar la propuesta
                if let Err(e) = stdin.write_all(input).await {
                    debug!("engine:stdin chain={chain_index} step={step_number} err={e}");
                }
            }
            child.wait_with_output().await
        };

        let output = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(res) => res?,
            Err(_) => {
                warn!("engine:timeout chain={} step={} after={:?}",
                      job.chain_index,
                      job.step_number,
                      self.timeout);
                return Err(EngineError::Timeout { seconds: self.timeout.as_secs() });
            }
        };
        debug!("engine:exit chain={} step={} status={:?}",
               job.chain_index,
               job.step_number,
               output.status.code());
        if !output.status.success() {
            return Err(EngineError::Crashed { exit_code: output.status.code(),
                                              stderr: String::from_utf8_lossy(&output.stderr).into_owned() });
        }
        let stdout = String::from_utf8(output.stdout).map_err(|e| EngineError::InvalidOutput(e.to_string()))?;
        Ok(EngineOutput { stdout, workdir })
    }
}
