//! Global and class-method access.
//!
//! These requests use plain list items for names, subscripts and values,
//! without the SQL parameter conventions. Their replies carry no SQL
//! status, so a server-side failure shows up only as an unexpected reply
//! payload.

use tokio::io::{AsyncRead, AsyncWrite};

use iris_protocol::{ListReader, MessageBuilder, Opcode};
use iris_types::{IrisValue, ToIris, from_list_item, to_list_item};

use crate::client::Client;
use crate::error::{Error, Result};

/// ORDER direction requesting the following subscript.
const ORDER_NEXT: i64 = 3;

/// ORDER direction requesting the preceding subscript.
const ORDER_PREVIOUS: i64 = 7;

/// Class and method answering the server version.
const VERSION_CLASS: &str = "%SYSTEM.Version";
const VERSION_METHOD: &str = "GetVersion";

/// What a global node holds, as answered by a DATA request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeInfo {
    /// The node stores a value.
    pub has_value: bool,
    /// The node has subscripted children.
    pub has_children: bool,
}

impl NodeInfo {
    /// Decode the DATA reply code: `1` value, `10` children, `11` both.
    #[must_use]
    pub fn from_code(code: i64) -> Self {
        Self {
            has_value: code % 10 == 1,
            has_children: code >= 10,
        }
    }

    /// Whether the node exists at all.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.has_value || self.has_children
    }
}

impl<T> Client<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Store `value` at `name(subscripts...)`.
    pub async fn global_set(
        &mut self,
        name: &str,
        value: &(dyn ToIris + Sync),
        subscripts: &[&(dyn ToIris + Sync)],
    ) -> Result<()> {
        let mut request = global_request(Opcode::GlobalSet, name, subscripts)?;
        request.push(&to_list_item(&value.to_iris()?)?);
        self.native_call(request).await.map(drop)
    }

    /// Read the value at `name(subscripts...)`.
    ///
    /// An undefined node reads as [`IrisValue::Null`].
    pub async fn global_get(
        &mut self,
        name: &str,
        subscripts: &[&(dyn ToIris + Sync)],
    ) -> Result<IrisValue> {
        let request = global_request(Opcode::GlobalGet, name, subscripts)?;
        let mut reader = self.native_call(request).await?;
        first_value(&mut reader)
    }

    /// Delete `name(subscripts...)` and everything below it.
    pub async fn global_kill(
        &mut self,
        name: &str,
        subscripts: &[&(dyn ToIris + Sync)],
    ) -> Result<()> {
        let request = global_request(Opcode::GlobalKill, name, subscripts)?;
        self.native_call(request).await.map(drop)
    }

    /// Report whether `name(subscripts...)` has a value and children.
    pub async fn global_is_defined(
        &mut self,
        name: &str,
        subscripts: &[&(dyn ToIris + Sync)],
    ) -> Result<NodeInfo> {
        let mut request = global_request(Opcode::GlobalData, name, subscripts)?;
        request.push_int(0);
        let mut reader = self.native_call(request).await?;
        Ok(NodeInfo::from_code(reader.read_i64()?))
    }

    /// The subscript following `current` under `name(subscripts...)`.
    ///
    /// Pass an empty `current` to start from the first subscript. Returns
    /// `None` past the last one.
    pub async fn global_next(
        &mut self,
        name: &str,
        subscripts: &[&(dyn ToIris + Sync)],
        current: &str,
    ) -> Result<Option<String>> {
        self.global_order(name, subscripts, current, ORDER_NEXT).await
    }

    /// The subscript preceding `current` under `name(subscripts...)`.
    pub async fn global_prev(
        &mut self,
        name: &str,
        subscripts: &[&(dyn ToIris + Sync)],
        current: &str,
    ) -> Result<Option<String>> {
        self.global_order(name, subscripts, current, ORDER_PREVIOUS).await
    }

    async fn global_order(
        &mut self,
        name: &str,
        subscripts: &[&(dyn ToIris + Sync)],
        current: &str,
        direction: i64,
    ) -> Result<Option<String>> {
        let mut request = MessageBuilder::new(Opcode::GlobalOrder);
        request.push_str(name).push_int(subscripts.len() as i64 + 1);
        push_values(&mut request, subscripts)?;
        request.push_str(current).push_int(direction);

        let mut reader = self.native_call(request).await?;
        if reader.is_exhausted() {
            return Ok(None);
        }
        let subscript = reader.read_string()?;
        Ok((!subscript.is_empty()).then_some(subscript))
    }

    /// Call a class method and return its result.
    pub async fn class_method_value(
        &mut self,
        class: &str,
        method: &str,
        args: &[&(dyn ToIris + Sync)],
    ) -> Result<IrisValue> {
        let request = method_request(Opcode::ClassMethodValue, class, method, args)?;
        let mut reader = self.native_call(request).await?;
        first_value(&mut reader)
    }

    /// Call a class method that returns nothing.
    pub async fn class_method_void(
        &mut self,
        class: &str,
        method: &str,
        args: &[&(dyn ToIris + Sync)],
    ) -> Result<()> {
        let request = method_request(Opcode::ClassMethodVoid, class, method, args)?;
        self.native_call(request).await.map(drop)
    }

    /// The server's version string.
    pub async fn server_version(&mut self) -> Result<String> {
        match self.class_method_value(VERSION_CLASS, VERSION_METHOD, &[]).await? {
            IrisValue::Text(version) => Ok(version),
            IrisValue::Null => Ok(String::new()),
            other => Err(Error::Type(iris_types::TypeError::TypeMismatch {
                expected: "version string",
                actual: other.type_name().to_string(),
            })),
        }
    }

    async fn native_call(&mut self, request: MessageBuilder) -> Result<ListReader> {
        self.state().check_usable()?;
        tracing::debug!(opcode = ?request.opcode(), "native call");
        let result = self.exchange(request, 0).await;
        let reply = self.settle(result)?;
        Ok(reply.reader())
    }
}

fn global_request(
    opcode: Opcode,
    name: &str,
    subscripts: &[&(dyn ToIris + Sync)],
) -> Result<MessageBuilder> {
    let mut request = MessageBuilder::new(opcode);
    request.push_str(name).push_int(subscripts.len() as i64);
    push_values(&mut request, subscripts)?;
    Ok(request)
}

fn method_request(
    opcode: Opcode,
    class: &str,
    method: &str,
    args: &[&(dyn ToIris + Sync)],
) -> Result<MessageBuilder> {
    let mut request = MessageBuilder::new(opcode);
    request
        .push_str(class)
        .push_str(method)
        .push_int(args.len() as i64);
    push_values(&mut request, args)?;
    Ok(request)
}

fn push_values(request: &mut MessageBuilder, values: &[&(dyn ToIris + Sync)]) -> Result<()> {
    for value in values {
        request.push(&to_list_item(&value.to_iris()?)?);
    }
    Ok(())
}

fn first_value(reader: &mut ListReader) -> Result<IrisValue> {
    if reader.is_exhausted() {
        return Ok(IrisValue::Null);
    }
    Ok(from_list_item(&reader.next_item()?)?)
}
