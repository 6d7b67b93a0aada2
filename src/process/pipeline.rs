use std::io;
use std::os::fd::{FromRawFd, OwnedFd};

use super::stage::Stage;
use super::ProcessError;

/// Where one end of a stage's standard streams goes.
#[derive(Debug)]
pub enum Endpoint {
    /// The shell's own stream when in the foreground, `/dev/null` in the background.
    Shell,
    /// An inter-stage pipe allocated by [`Pipeline::build`].
    Pipe(OwnedFd),
    /// An explicit redirection supplied by the caller.
    Redirect(OwnedFd),
}

#[derive(Debug)]
pub struct WiredStage {
    pub stage: Stage,
    pub stdin: Endpoint,
    pub stdout: Endpoint,
}

/// An ordered chain of stages whose standard streams are already connected.
///
/// Nothing is started yet; the pipe ends are plain owned descriptors that
/// close when dropped.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<WiredStage>,
}

impl Pipeline {
    pub fn build(stages: Vec<Stage>) -> Result<Self, ProcessError> {
        if stages.is_empty() {
            return Err(ProcessError::EmptyPipeline);
        }

        let mut wired: Vec<WiredStage> = stages
            .into_iter()
            .map(|stage| WiredStage {
                stage,
                stdin: Endpoint::Shell,
                stdout: Endpoint::Shell,
            })
            .collect();

        // On failure `wired` is dropped, closing every pipe allocated so far.
        for i in 1..wired.len() {
            let (reader, writer) = stream_pair().map_err(ProcessError::StreamAllocation)?;
            wired[i - 1].stdout = Endpoint::Pipe(writer);
            wired[i].stdin = Endpoint::Pipe(reader);
        }

        Ok(Self { stages: wired })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Number of inter-stage connections.
    pub fn junctions(&self) -> usize {
        self.stages
            .iter()
            .filter(|wired| matches!(wired.stdout, Endpoint::Pipe(_)))
            .count()
    }

    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().map(|wired| &wired.stage)
    }

    pub fn redirect_input(&mut self, fd: OwnedFd) {
        if let Some(first) = self.stages.first_mut() {
            first.stdin = Endpoint::Redirect(fd);
        }
    }

    pub fn redirect_output(&mut self, fd: OwnedFd) {
        if let Some(last) = self.stages.last_mut() {
            last.stdout = Endpoint::Redirect(fd);
        }
    }

    pub fn describe(&self) -> String {
        self.stages()
            .map(Stage::describe)
            .collect::<Vec<_>>()
            .join(" | ")
    }

    pub(crate) fn into_stages(self) -> Vec<WiredStage> {
        self.stages
    }
}

/// Allocates a close-on-exec pipe, returning `(read end, write end)`.
pub fn stream_pair() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds = [0 as libc::c_int; 2];

    #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
    {
        // SAFETY: `fds` is a valid two-element array for pipe2 to fill.
        if unsafe { libc::pipe2(fds.as_mut_ptr(), libc::O_CLOEXEC) } != 0 {
            return Err(io::Error::last_os_error());
        }
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
    {
        // SAFETY: `fds` is a valid two-element array for pipe to fill.
        if unsafe { libc::pipe(fds.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        for fd in fds {
            // SAFETY: `fd` was just returned by pipe and is open.
            if unsafe { libc::fcntl(fd, libc::F_SETFD, libc::FD_CLOEXEC) } != 0 {
                let err = io::Error::last_os_error();
                // SAFETY: both descriptors are open and owned by us.
                unsafe {
                    libc::close(fds[0]);
                    libc::close(fds[1]);
                }
                return Err(err);
            }
        }
    }

    // SAFETY: both descriptors are freshly created and owned by nobody else.
    let (reader, writer) = unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) };
    Ok((reader, writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::{Read, Write};

    fn stages(n: usize) -> Vec<Stage> {
        (0..n)
            .map(|i| Stage::new("cat", vec![format!("-{}", i)]))
            .collect()
    }

    #[test]
    fn test_junction_count() {
        for n in 1..=6 {
            let pipeline = Pipeline::build(stages(n)).expect("build failed");
            assert_eq!(pipeline.len(), n);
            assert_eq!(pipeline.junctions(), n - 1);
        }
    }

    #[test]
    fn test_empty_pipeline_rejected() {
        assert!(matches!(
            Pipeline::build(Vec::new()),
            Err(ProcessError::EmptyPipeline)
        ));
    }

    #[test]
    fn test_outer_ends_belong_to_shell() {
        let pipeline = Pipeline::build(stages(3)).expect("build failed");
        let wired = pipeline.into_stages();
        assert!(matches!(wired[0].stdin, Endpoint::Shell));
        assert!(matches!(wired[2].stdout, Endpoint::Shell));
        assert!(matches!(wired[1].stdin, Endpoint::Pipe(_)));
        assert!(matches!(wired[1].stdout, Endpoint::Pipe(_)));
    }

    #[test]
    fn test_redirect_does_not_count_as_junction() {
        let (_reader, writer) = stream_pair().expect("pipe");
        let mut pipeline = Pipeline::build(stages(2)).expect("build failed");
        pipeline.redirect_output(writer);
        assert_eq!(pipeline.junctions(), 1);
    }

    #[test]
    fn test_stream_pair_carries_bytes() {
        let (reader, writer) = stream_pair().expect("pipe");
        let mut writer = File::from(writer);
        writer.write_all(b"hello").expect("write");
        drop(writer);

        let mut out = String::new();
        File::from(reader).read_to_string(&mut out).expect("read");
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_describe() {
        let pipeline = Pipeline::build(vec![
            Stage::new("ls", vec!["-l".to_string()]),
            Stage::new("wc", vec!["-l".to_string()]),
        ])
        .expect("build failed");
        assert_eq!(pipeline.describe(), "ls -l | wc -l");
    }
}
