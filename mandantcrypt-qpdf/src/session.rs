//! Scoped qpdf session: one native context driven through
//! init → read → init_write → write, released exactly once.

use crate::bindings::{
    ContextHandle, ModifyLevel, ObjectStreamMode, PrintLevel, QpdfApi, R6Parameters,
    ReturnStatus, QPDF_ERRORS, QPDF_WARNINGS,
};
use crate::error::{NativeError, NativeErrorCode, QpdfError, QpdfResult};
use crate::library::QpdfLibrary;
use std::ffi::CString;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Lifecycle of the native context owned by a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
    ReadLoaded,
    WriteReady,
    Closed,
}

/// Parsed `qpdf_get_qpdf_version` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LibraryVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl LibraryVersion {
    pub fn parse(text: &str) -> QpdfResult<Self> {
        let mut parts = text.trim().split('.');
        let mut next = || -> QpdfResult<u32> {
            parts
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(|| QpdfError::Version(text.to_string()))
        };
        Ok(Self {
            major: next()?,
            minor: next()?,
            patch: next()?,
        })
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Settings applied immediately before `qpdf_write`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub compress_streams: bool,
    pub qdf_mode: bool,
    pub object_streams: ObjectStreamMode,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress_streams: true,
            qdf_mode: false,
            object_streams: ObjectStreamMode::Generate,
        }
    }
}

impl WriteOptions {
    pub fn uncompressed() -> Self {
        Self {
            compress_streams: false,
            ..Self::default()
        }
    }
}

/// AES-256 (R6) encryption staged for the next write.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionOptions {
    user_password: String,
    owner_password: String,
    #[zeroize(skip)]
    pub print: PrintLevel,
    #[zeroize(skip)]
    pub modify: ModifyLevel,
    pub allow_extract: bool,
    pub encrypt_metadata: bool,
}

impl EncryptionOptions {
    pub fn new(
        user_password: &str,
        owner_password: &str,
        print: PrintLevel,
        modify: ModifyLevel,
        allow_extract: bool,
        encrypt_metadata: bool,
    ) -> Self {
        Self {
            user_password: user_password.to_string(),
            owner_password: owner_password.to_string(),
            print,
            modify,
            allow_extract,
            encrypt_metadata,
        }
    }

    /// Same password for both roles; no printing, no modification, no
    /// extraction; metadata encrypted.
    pub fn restrictive(password: &str) -> Self {
        Self::new(
            password,
            password,
            PrintLevel::None,
            ModifyLevel::None,
            false,
            true,
        )
    }

    pub fn user_password(&self) -> &str {
        &self.user_password
    }

    pub fn owner_password(&self) -> &str {
        &self.owner_password
    }
}

impl fmt::Debug for EncryptionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionOptions")
            .field("print", &self.print)
            .field("modify", &self.modify)
            .field("allow_extract", &self.allow_extract)
            .field("encrypt_metadata", &self.encrypt_metadata)
            .finish_non_exhaustive()
    }
}

/// A single native document context.
///
/// The context is released by [`close`](Self::close) or, at the latest, when
/// the session is dropped. Not `Sync`: a session belongs to one packaging
/// operation.
pub struct NativeDocumentSession<L: QpdfApi = QpdfLibrary> {
    lib: L,
    ctx: Option<ContextHandle>,
    state: SessionState,
    // Borrowed by the native context until cleanup.
    memory_source: Option<Vec<u8>>,
    memory_target: bool,
    memory_output: bool,
}

impl NativeDocumentSession<QpdfLibrary> {
    /// Loads the library at `library_path` and returns an uninitialized session.
    pub fn open(library_path: impl AsRef<Path>) -> QpdfResult<Self> {
        Ok(Self::with_library(QpdfLibrary::load(library_path)?))
    }
}

impl<L: QpdfApi> NativeDocumentSession<L> {
    pub fn with_library(lib: L) -> Self {
        Self {
            lib,
            ctx: None,
            state: SessionState::Uninitialized,
            memory_source: None,
            memory_target: false,
            memory_output: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn library(&self) -> &L {
        &self.lib
    }

    pub fn is_initialized(&self) -> bool {
        self.ctx.is_some()
    }

    pub fn library_version_string(&self) -> String {
        self.lib.version()
    }

    pub fn library_version(&self) -> QpdfResult<LibraryVersion> {
        LibraryVersion::parse(&self.lib.version())
    }

    /// Allocates the native context. A no-op returning the existing handle
    /// when already initialized.
    pub fn init_context(&mut self) -> QpdfResult<ContextHandle> {
        if self.state == SessionState::Closed {
            return Err(QpdfError::Closed);
        }
        if let Some(ctx) = self.ctx {
            return Ok(ctx);
        }
        let ctx = self.lib.init().ok_or_else(|| QpdfError::Operation {
            code: NativeErrorCode::System,
            message: "qpdf_init returned a null context".to_string(),
        })?;
        self.ctx = Some(ctx);
        self.state = SessionState::Initialized;
        debug!("qpdf context initialized");
        Ok(ctx)
    }

    /// Parses the document at `path`, decrypting with `password` if given.
    /// An empty password is passed to the library as no password.
    pub fn read_document(&mut self, path: &Path, password: Option<&str>) -> QpdfResult<()> {
        let ctx = self.require(SessionState::Initialized)?;
        let c_path = path_to_cstring(path)?;
        let c_password = password
            .filter(|p| !p.is_empty())
            .map(str_to_cstring)
            .transpose()?;

        let status = self.lib.read(ctx, &c_path, c_password.as_deref());
        self.check(ctx, status, "read")?;
        self.state = SessionState::ReadLoaded;
        debug!("read {} into qpdf context", path.display());
        Ok(())
    }

    /// Like [`read_document`](Self::read_document) but parses `data`. The
    /// session keeps `data` alive until the context is released.
    pub fn read_document_bytes(
        &mut self,
        description: &str,
        data: Vec<u8>,
        password: Option<&str>,
    ) -> QpdfResult<()> {
        let ctx = self.require(SessionState::Initialized)?;
        let c_description = str_to_cstring(description)?;
        let c_password = password
            .filter(|p| !p.is_empty())
            .map(str_to_cstring)
            .transpose()?;

        let buffer = self.memory_source.insert(data);
        // SAFETY: `memory_source` is only dropped or replaced after `close`
        // has released `ctx`, and a Vec's heap block does not move with it.
        let status = unsafe {
            self.lib
                .read_memory(ctx, &c_description, buffer.as_slice(), c_password.as_deref())
        };
        self.check(ctx, status, "read_memory")?;
        self.state = SessionState::ReadLoaded;
        debug!("read {description} from memory into qpdf context");
        Ok(())
    }

    pub fn is_encrypted(&self) -> QpdfResult<bool> {
        let ctx = self.context()?;
        match self.state {
            SessionState::ReadLoaded | SessionState::WriteReady => Ok(self.lib.is_encrypted(ctx)),
            _ => Err(QpdfError::NoDocumentLoaded),
        }
    }

    /// Declares the output file of the next write.
    pub fn init_write(&mut self, target: &Path) -> QpdfResult<()> {
        let ctx = self.context()?;
        match self.state {
            SessionState::ReadLoaded | SessionState::WriteReady => {}
            _ => return Err(QpdfError::NoDocumentLoaded),
        }
        let c_target = path_to_cstring(target)?;

        // A failed init_write leaves no usable write target.
        self.state = SessionState::ReadLoaded;
        let status = self.lib.init_write(ctx, &c_target);
        self.check(ctx, status, "init_write")?;
        self.state = SessionState::WriteReady;
        self.memory_target = false;
        debug!("qpdf write target set to {}", target.display());
        Ok(())
    }

    /// Declares an in-memory buffer as the output of the next write; fetch
    /// it with [`written_bytes`](Self::written_bytes).
    pub fn init_write_memory(&mut self) -> QpdfResult<()> {
        let ctx = self.context()?;
        match self.state {
            SessionState::ReadLoaded | SessionState::WriteReady => {}
            _ => return Err(QpdfError::NoDocumentLoaded),
        }
        self.state = SessionState::ReadLoaded;
        let status = self.lib.init_write_memory(ctx);
        self.check(ctx, status, "init_write_memory")?;
        self.state = SessionState::WriteReady;
        self.memory_target = true;
        Ok(())
    }

    /// Output of the last successful write to memory.
    pub fn written_bytes(&self) -> QpdfResult<Vec<u8>> {
        let ctx = self.context()?;
        if !self.memory_output {
            return Err(QpdfError::InvalidArgument(
                "no in-memory write has completed".to_string(),
            ));
        }
        Ok(self.lib.take_buffer(ctx))
    }

    /// Stages AES-256 encryption for the next write.
    pub fn set_encryption_options(&mut self, options: &EncryptionOptions) -> QpdfResult<()> {
        let ctx = self.require_write_ready()?;
        let user = str_to_cstring(options.user_password())?;
        let owner = str_to_cstring(options.owner_password())?;
        self.lib.set_r6_encryption_parameters(
            ctx,
            &R6Parameters {
                user_password: &user,
                owner_password: &owner,
                allow_accessibility: true,
                allow_extract: options.allow_extract,
                print: options.print,
                modify: options.modify,
                encrypt_metadata: options.encrypt_metadata,
            },
        );
        debug!("staged AES-256 encryption for next write");
        Ok(())
    }

    pub fn set_restrictive_encryption(&mut self, password: &str) -> QpdfResult<()> {
        self.set_encryption_options(&EncryptionOptions::restrictive(password))
    }

    /// Whether the next write keeps the input's encryption. The library
    /// preserves it unless told otherwise.
    pub fn set_preserve_encryption(&mut self, preserve: bool) -> QpdfResult<()> {
        let ctx = self.require_write_ready()?;
        self.lib.set_preserve_encryption(ctx, preserve);
        Ok(())
    }

    /// Applies `options` and writes to the target declared by
    /// [`init_write`](Self::init_write). The target is consumed: another
    /// write needs another `init_write`.
    pub fn write(&mut self, options: WriteOptions) -> QpdfResult<()> {
        let ctx = self.require_write_ready()?;
        self.lib.set_qdf_mode(ctx, options.qdf_mode);
        self.lib.set_object_stream_mode(ctx, options.object_streams);
        self.lib.set_compress_streams(ctx, options.compress_streams);
        self.lib.set_newline_before_endstream(ctx, true);

        self.state = SessionState::ReadLoaded;
        self.memory_output = false;
        let status = self.lib.write(ctx);
        self.check(ctx, status, "write")?;
        self.memory_output = self.memory_target;
        Ok(())
    }

    /// `init_write` followed by `write`.
    pub fn write_simple(&mut self, target: &Path, compressed: bool) -> QpdfResult<()> {
        self.init_write(target)?;
        let options = if compressed {
            WriteOptions::default()
        } else {
            WriteOptions::uncompressed()
        };
        self.write(options)
    }

    pub fn has_error(&self) -> QpdfResult<bool> {
        Ok(self.lib.has_error(self.context()?))
    }

    /// Retrieves (and clears) the pending native error, if any.
    pub fn last_error(&mut self) -> QpdfResult<Option<NativeError>> {
        let ctx = self.context()?;
        Ok(self.lib.take_error(ctx))
    }

    /// Releases the native context. Idempotent.
    pub fn close(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            self.lib.cleanup(ctx);
            debug!("qpdf context released");
        }
        self.memory_source = None;
        self.memory_output = false;
        self.state = SessionState::Closed;
    }

    fn context(&self) -> QpdfResult<ContextHandle> {
        match (self.state, self.ctx) {
            (SessionState::Closed, _) => Err(QpdfError::Closed),
            (_, Some(ctx)) => Ok(ctx),
            (_, None) => Err(QpdfError::NotInitialized),
        }
    }

    fn require(&self, expected: SessionState) -> QpdfResult<ContextHandle> {
        let ctx = self.context()?;
        if self.state != expected {
            return Err(match expected {
                SessionState::WriteReady => QpdfError::WriteNotInitialized,
                _ => QpdfError::InvalidArgument(format!(
                    "session is {:?}, expected {expected:?}",
                    self.state
                )),
            });
        }
        Ok(ctx)
    }

    fn require_write_ready(&self) -> QpdfResult<ContextHandle> {
        self.require(SessionState::WriteReady)
    }

    /// Turns a native return status into a result, draining warnings and
    /// fetching the structured error on failure.
    fn check(&self, ctx: ContextHandle, status: ReturnStatus, op: &str) -> QpdfResult<()> {
        if status & QPDF_WARNINGS != 0 {
            for warning in self.lib.take_warnings(ctx) {
                warn!("qpdf {op} warning: {warning}");
            }
        }
        if status & QPDF_ERRORS == 0 && !self.lib.has_error(ctx) {
            return Ok(());
        }
        let err = self.lib.take_error(ctx).unwrap_or_else(|| NativeError {
            code: NativeErrorCode::Internal,
            message: format!("qpdf {op} failed with status {status} and no error detail"),
        });
        Err(err.into())
    }
}

impl<L: QpdfApi> Drop for NativeDocumentSession<L> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<L: QpdfApi> fmt::Debug for NativeDocumentSession<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeDocumentSession")
            .field("state", &self.state)
            .field("initialized", &self.ctx.is_some())
            .finish()
    }
}

fn str_to_cstring(value: &str) -> QpdfResult<CString> {
    CString::new(value)
        .map_err(|_| QpdfError::InvalidArgument("string contains a NUL byte".to_string()))
}

#[cfg(unix)]
fn path_to_cstring(path: &Path) -> QpdfResult<CString> {
    use std::os::unix::ffi::OsStrExt;
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        QpdfError::InvalidArgument(format!("path contains a NUL byte: {}", path.display()))
    })
}

#[cfg(not(unix))]
fn path_to_cstring(path: &Path) -> QpdfResult<CString> {
    let text = path.to_str().ok_or_else(|| {
        QpdfError::InvalidArgument(format!("path is not valid text: {}", path.display()))
    })?;
    str_to_cstring(text)
}
