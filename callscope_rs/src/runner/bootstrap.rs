//! The Python-side hook bootstrap.
//!
//! The tracer cannot patch a foreign interpreter from outside the process,
//! so the target script runs under this bootstrap instead. It is mechanical
//! by design: install `sys.settrace`/`threading.settrace` and per-class
//! `__setattr__` wrappers, stream raw frame facts as JSON lines, restore
//! everything on the way out. Which frames count, what they are called, and
//! which assignments match a watch target is decided by the Rust session.
//!
//! Raw lines are hand-formatted with `str` operations only so the emit path
//! never pushes stdlib frames into the very stream it is writing.

/// Configuration is passed through this environment variable as JSON:
/// `{script, trace, coverage, events, watches: [{aliases, class, attr, main_alias}]}`.
pub const CONFIG_ENV: &str = "CALLSCOPE_BOOTSTRAP";

pub const PYTHON_BOOTSTRAP: &str = r##"# callscope hook bootstrap (generated; do not edit)
__name__ = "_callscope_bootstrap"

import json
import os
import runpy
import sys
import threading

_cfg = json.loads(os.environ["CALLSCOPE_BOOTSTRAP"])
_script = os.path.abspath(_cfg["script"])
_trace_on = bool(_cfg["trace"])
_coverage_on = bool(_cfg["coverage"])
_watches = _cfg["watches"]
_out = open(_cfg["events"], "w", encoding="utf-8")
_lock = threading.Lock()


def _jstr(text):
    body = text.replace("\\", "\\\\").replace('"', '\\"')
    body = body.replace("\n", "\\n").replace("\r", "\\r").replace("\t", "\\t")
    chunks = []
    for ch in body:
        if ch < " ":
            chunks.append("\\u%04x" % ord(ch))
        else:
            chunks.append(ch)
    return '"' + "".join(chunks) + '"'


def _opt(text):
    return "null" if text is None else _jstr(text)


def _emit(line):
    with _lock:
        _out.write(line)


def _frame_fields(frame):
    module = frame.f_globals.get("__name__", "") or ""
    func = frame.f_code.co_name
    self_class = None
    if "self" in frame.f_locals:
        try:
            self_class = type(frame.f_locals["self"]).__name__
        except Exception:
            self_class = None
    return module, func, self_class


_patched = {}
_class_specs = {}
_pending = list(range(len(_watches)))


def _wrap_class(cls):
    if cls in _patched:
        return
    original = getattr(cls, "__setattr__", None)
    _patched[cls] = original

    def _hooked_setattr(obj, name, value, _cls=cls, _original=original):
        for attr, spec_id in _class_specs.get(_cls, ()):
            if name != attr:
                continue
            try:
                rendered = repr(value)
            except Exception:
                rendered = "<unreprizable>"
            try:
                frame = sys._getframe(1)
            except ValueError:
                frame = None
            if frame is not None:
                module, func, self_class = _frame_fields(frame)
                _emit('{"kind": "assign", "id": %d, "module": %s, "func": %s,'
                      ' "self_class": %s, "file": %s, "line": %d, "value": %s}\n'
                      % (spec_id, _jstr(module), _jstr(func), _opt(self_class),
                         _jstr(frame.f_code.co_filename), frame.f_lineno or 0,
                         _jstr(rendered)))
            else:
                _emit('{"kind": "assign", "id": %d, "module": null, "func": null,'
                      ' "self_class": null, "file": null, "line": null, "value": %s}\n'
                      % (spec_id, _jstr(rendered)))
        if _original is not None:
            try:
                _original(obj, name, value)
            except TypeError:
                object.__setattr__(obj, name, value)
        else:
            object.__setattr__(obj, name, value)

    cls.__setattr__ = _hooked_setattr


def _attach_pending(module_name):
    if not _pending:
        return
    module = sys.modules.get(module_name)
    if module is None:
        return
    try:
        module_file = os.path.abspath(getattr(module, "__file__", "") or "")
    except Exception:
        module_file = ""
    attached = []
    for idx in list(_pending):
        spec = _watches[idx]
        matches = module_name in spec["aliases"]
        if not matches and spec["main_alias"]:
            matches = module_name == "__main__" and module_file == _script
        if not matches:
            continue
        cls = getattr(module, spec["class"], None)
        if cls is None or not isinstance(cls, type):
            continue
        entry = (spec["attr"], idx)
        specs = _class_specs.setdefault(cls, [])
        if entry not in specs:
            specs.append(entry)
        _wrap_class(cls)
        _emit('{"kind": "watched", "id": %d}\n' % idx)
        attached.append(idx)
    for idx in attached:
        _pending.remove(idx)


def _tracer(frame, event, arg):
    if _watches:
        _attach_pending(frame.f_globals.get("__name__", "") or "")
    if event == "call":
        if _trace_on or _coverage_on:
            module, func, self_class = _frame_fields(frame)
            _emit('{"kind": "call", "module": %s, "func": %s, "self_class": %s}\n'
                  % (_jstr(module), _jstr(func), _opt(self_class)))
    elif event == "return":
        if _trace_on:
            try:
                rendered = repr(arg)
            except Exception:
                rendered = "<unreprizable>"
            module, func, self_class = _frame_fields(frame)
            _emit('{"kind": "return", "module": %s, "func": %s,'
                  ' "self_class": %s, "value": %s}\n'
                  % (_jstr(module), _jstr(func), _opt(self_class), _jstr(rendered)))
    return _tracer


if _trace_on or _coverage_on or _watches:
    sys.settrace(_tracer)
    threading.settrace(_tracer)
try:
    runpy.run_path(_script, run_name="__main__")
except Exception as exc:
    print("Error during execution: %s" % (exc,))
finally:
    sys.settrace(None)
    threading.settrace(None)
    for cls, original in _patched.items():
        if original is not None:
            cls.__setattr__ = original
        else:
            cls.__setattr__ = object.__setattr__
    _out.flush()
    _out.close()
"##;
