//! Dynamic loading of the qpdf shared library.

use crate::bindings::{
    ContextHandle, ObjectStreamMode, QpdfApi, R6Parameters, ReturnStatus,
};
use crate::error::{NativeError, NativeErrorCode, QpdfError, QpdfResult};
use libloading::{Library, Symbol};
use std::ffi::{c_char, c_int, c_ulonglong, c_void, CStr};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the library location.
pub const LIBRARY_PATH_ENV: &str = "MANDANTCRYPT_QPDF_LIB";

/// File name of the qpdf shared library on this platform.
#[cfg(windows)]
pub const DEFAULT_LIBRARY_NAME: &str = "qpdf29.dll";
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY_NAME: &str = "libqpdf.29.dylib";
#[cfg(all(unix, not(target_os = "macos")))]
pub const DEFAULT_LIBRARY_NAME: &str = "libqpdf.so.29";

/// Library location from [`LIBRARY_PATH_ENV`], else the bare platform name
/// (resolved through the system loader search path).
pub fn default_library_path() -> PathBuf {
    std::env::var_os(LIBRARY_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LIBRARY_NAME))
}

type QpdfData = *mut c_void;
type QpdfErrorPtr = *mut c_void;

/// Resolved entry points. Valid for as long as the owning [`Library`] is loaded.
struct Symbols {
    get_qpdf_version: unsafe extern "C" fn() -> *const c_char,
    init: unsafe extern "C" fn() -> QpdfData,
    cleanup: unsafe extern "C" fn(*mut QpdfData),
    has_error: unsafe extern "C" fn(QpdfData) -> c_int,
    get_error: unsafe extern "C" fn(QpdfData) -> QpdfErrorPtr,
    get_error_full_text: unsafe extern "C" fn(QpdfData, QpdfErrorPtr) -> *const c_char,
    get_error_code: unsafe extern "C" fn(QpdfData, QpdfErrorPtr) -> c_int,
    more_warnings: unsafe extern "C" fn(QpdfData) -> c_int,
    next_warning: unsafe extern "C" fn(QpdfData) -> QpdfErrorPtr,
    read: unsafe extern "C" fn(QpdfData, *const c_char, *const c_char) -> c_int,
    read_memory:
        unsafe extern "C" fn(QpdfData, *const c_char, *const c_char, c_ulonglong, *const c_char) -> c_int,
    is_encrypted: unsafe extern "C" fn(QpdfData) -> c_int,
    init_write: unsafe extern "C" fn(QpdfData, *const c_char) -> c_int,
    init_write_memory: unsafe extern "C" fn(QpdfData) -> c_int,
    get_buffer_length: unsafe extern "C" fn(QpdfData) -> usize,
    get_buffer: unsafe extern "C" fn(QpdfData) -> *const u8,
    set_object_stream_mode: unsafe extern "C" fn(QpdfData, c_int),
    set_qdf_mode: unsafe extern "C" fn(QpdfData, c_int),
    set_compress_streams: unsafe extern "C" fn(QpdfData, c_int),
    set_newline_before_endstream: unsafe extern "C" fn(QpdfData, c_int),
    set_preserve_encryption: unsafe extern "C" fn(QpdfData, c_int),
    set_r6_encryption_parameters: unsafe extern "C" fn(
        QpdfData,
        *const c_char,
        *const c_char,
        c_int,
        c_int,
        c_int,
        c_int,
        c_int,
    ),
    write: unsafe extern "C" fn(QpdfData) -> c_int,
}

/// A loaded qpdf shared library.
pub struct QpdfLibrary {
    path: PathBuf,
    syms: Symbols,
    // Keeps `syms` valid.
    _lib: Library,
}

impl std::fmt::Debug for QpdfLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QpdfLibrary").field("path", &self.path).finish()
    }
}

impl QpdfLibrary {
    /// Loads the library at `path`.
    ///
    /// A directory is resolved to [`DEFAULT_LIBRARY_NAME`] inside it. A path
    /// with a directory component must exist on disk; a bare file name is
    /// handed to the system loader as is.
    pub fn load(path: impl AsRef<Path>) -> QpdfResult<Self> {
        let mut path = path.as_ref().to_path_buf();
        if path.is_dir() {
            path = path.join(DEFAULT_LIBRARY_NAME);
        }
        let has_dir = path
            .parent()
            .is_some_and(|parent| !parent.as_os_str().is_empty());
        if has_dir && !path.is_file() {
            return Err(load_error(&path, "file not found"));
        }

        // SAFETY: loading qpdf runs its static initializers only; it has no
        // load-time side effects on the process beyond that.
        let lib = unsafe { Library::new(&path) }.map_err(|e| load_error(&path, e))?;
        let syms = unsafe { Symbols::resolve(&lib, &path)? };
        debug!("loaded qpdf library from {}", path.display());

        Ok(Self {
            path,
            syms,
            _lib: lib,
        })
    }

    /// Loads the library from [`default_library_path`].
    pub fn load_default() -> QpdfResult<Self> {
        Self::load(default_library_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_error(path: &Path, reason: impl std::fmt::Display) -> QpdfError {
    let shown = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    QpdfError::LibraryLoad {
        path: shown,
        reason: reason.to_string(),
    }
}

impl Symbols {
    /// # Safety
    /// Each symbol is cast to the signature declared in qpdf's `qpdf-c.h`.
    unsafe fn resolve(lib: &Library, path: &Path) -> QpdfResult<Self> {
        unsafe fn get<T: Copy>(lib: &Library, path: &Path, name: &str) -> QpdfResult<T> {
            let mut symbol_name = name.as_bytes().to_vec();
            symbol_name.push(0);
            let symbol: Symbol<'_, T> = unsafe { lib.get(&symbol_name) }
                .map_err(|e| load_error(path, format!("missing symbol {name}: {e}")))?;
            Ok(*symbol)
        }

        unsafe {
            Ok(Self {
                get_qpdf_version: get(lib, path, "qpdf_get_qpdf_version")?,
                init: get(lib, path, "qpdf_init")?,
                cleanup: get(lib, path, "qpdf_cleanup")?,
                has_error: get(lib, path, "qpdf_has_error")?,
                get_error: get(lib, path, "qpdf_get_error")?,
                get_error_full_text: get(lib, path, "qpdf_get_error_full_text")?,
                get_error_code: get(lib, path, "qpdf_get_error_code")?,
                more_warnings: get(lib, path, "qpdf_more_warnings")?,
                next_warning: get(lib, path, "qpdf_next_warning")?,
                read: get(lib, path, "qpdf_read")?,
                read_memory: get(lib, path, "qpdf_read_memory")?,
                is_encrypted: get(lib, path, "qpdf_is_encrypted")?,
                init_write: get(lib, path, "qpdf_init_write")?,
                init_write_memory: get(lib, path, "qpdf_init_write_memory")?,
                get_buffer_length: get(lib, path, "qpdf_get_buffer_length")?,
                get_buffer: get(lib, path, "qpdf_get_buffer")?,
                set_object_stream_mode: get(lib, path, "qpdf_set_object_stream_mode")?,
                set_qdf_mode: get(lib, path, "qpdf_set_qdf_mode")?,
                set_compress_streams: get(lib, path, "qpdf_set_compress_streams")?,
                set_newline_before_endstream: get(lib, path, "qpdf_set_newline_before_endstream")?,
                set_preserve_encryption: get(lib, path, "qpdf_set_preserve_encryption")?,
                set_r6_encryption_parameters: get(lib, path, "qpdf_set_r6_encryption_parameters")?,
                write: get(lib, path, "qpdf_write")?,
            })
        }
    }
}

/// Copies a library-owned C string.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string that stays valid
/// for the duration of the call.
unsafe fn c_text(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

fn flag(value: bool) -> c_int {
    c_int::from(value)
}

// All calls below pass a `qpdf_data` obtained from `qpdf_init` and not yet
// cleaned up; `NativeDocumentSession` guarantees that for every handle.
impl QpdfApi for QpdfLibrary {
    fn version(&self) -> String {
        unsafe { c_text((self.syms.get_qpdf_version)()) }
    }

    fn init(&self) -> Option<ContextHandle> {
        ContextHandle::from_raw(unsafe { (self.syms.init)() })
    }

    fn cleanup(&self, ctx: ContextHandle) {
        let mut data = ctx.as_ptr();
        unsafe { (self.syms.cleanup)(&mut data) }
    }

    fn has_error(&self, ctx: ContextHandle) -> bool {
        unsafe { (self.syms.has_error)(ctx.as_ptr()) != 0 }
    }

    fn take_error(&self, ctx: ContextHandle) -> Option<NativeError> {
        let data = ctx.as_ptr();
        unsafe {
            if (self.syms.has_error)(data) == 0 {
                return None;
            }
            let err = (self.syms.get_error)(data);
            if err.is_null() {
                return None;
            }
            let code = (self.syms.get_error_code)(data, err);
            let message = c_text((self.syms.get_error_full_text)(data, err));
            Some(NativeError {
                code: NativeErrorCode::from_raw(code).unwrap_or(NativeErrorCode::Internal),
                message,
            })
        }
    }

    fn take_warnings(&self, ctx: ContextHandle) -> Vec<String> {
        let data = ctx.as_ptr();
        let mut warnings = Vec::new();
        unsafe {
            while (self.syms.more_warnings)(data) != 0 {
                let warning = (self.syms.next_warning)(data);
                if warning.is_null() {
                    break;
                }
                warnings.push(c_text((self.syms.get_error_full_text)(data, warning)));
            }
        }
        warnings
    }

    fn read(&self, ctx: ContextHandle, path: &CStr, password: Option<&CStr>) -> ReturnStatus {
        let password = password.map_or(std::ptr::null(), CStr::as_ptr);
        unsafe { (self.syms.read)(ctx.as_ptr(), path.as_ptr(), password) }
    }

    unsafe fn read_memory(
        &self,
        ctx: ContextHandle,
        description: &CStr,
        buffer: &[u8],
        password: Option<&CStr>,
    ) -> ReturnStatus {
        let password = password.map_or(std::ptr::null(), CStr::as_ptr);
        unsafe {
            (self.syms.read_memory)(
                ctx.as_ptr(),
                description.as_ptr(),
                buffer.as_ptr().cast::<c_char>(),
                buffer.len() as c_ulonglong,
                password,
            )
        }
    }

    fn is_encrypted(&self, ctx: ContextHandle) -> bool {
        unsafe { (self.syms.is_encrypted)(ctx.as_ptr()) != 0 }
    }

    fn init_write(&self, ctx: ContextHandle, path: &CStr) -> ReturnStatus {
        unsafe { (self.syms.init_write)(ctx.as_ptr(), path.as_ptr()) }
    }

    fn init_write_memory(&self, ctx: ContextHandle) -> ReturnStatus {
        unsafe { (self.syms.init_write_memory)(ctx.as_ptr()) }
    }

    fn take_buffer(&self, ctx: ContextHandle) -> Vec<u8> {
        unsafe {
            let len = (self.syms.get_buffer_length)(ctx.as_ptr());
            let ptr = (self.syms.get_buffer)(ctx.as_ptr());
            if ptr.is_null() || len == 0 {
                return Vec::new();
            }
            std::slice::from_raw_parts(ptr, len).to_vec()
        }
    }

    fn set_object_stream_mode(&self, ctx: ContextHandle, mode: ObjectStreamMode) {
        unsafe { (self.syms.set_object_stream_mode)(ctx.as_ptr(), mode as c_int) }
    }

    fn set_qdf_mode(&self, ctx: ContextHandle, enabled: bool) {
        unsafe { (self.syms.set_qdf_mode)(ctx.as_ptr(), flag(enabled)) }
    }

    fn set_compress_streams(&self, ctx: ContextHandle, enabled: bool) {
        unsafe { (self.syms.set_compress_streams)(ctx.as_ptr(), flag(enabled)) }
    }

    fn set_newline_before_endstream(&self, ctx: ContextHandle, enabled: bool) {
        unsafe { (self.syms.set_newline_before_endstream)(ctx.as_ptr(), flag(enabled)) }
    }

    fn set_preserve_encryption(&self, ctx: ContextHandle, enabled: bool) {
        unsafe { (self.syms.set_preserve_encryption)(ctx.as_ptr(), flag(enabled)) }
    }

    fn set_r6_encryption_parameters(&self, ctx: ContextHandle, params: &R6Parameters<'_>) {
        unsafe {
            (self.syms.set_r6_encryption_parameters)(
                ctx.as_ptr(),
                params.user_password.as_ptr(),
                params.owner_password.as_ptr(),
                flag(params.allow_accessibility),
                flag(params.allow_extract),
                params.print as c_int,
                params.modify as c_int,
                flag(params.encrypt_metadata),
            )
        }
    }

    fn write(&self, ctx: ContextHandle) -> ReturnStatus {
        unsafe { (self.syms.write)(ctx.as_ptr()) }
    }
}
