// ==========================================
// 表格数据导入 - 字段映射引擎
// ==========================================
// 职责: 已校验行 → 强类型记录（按记录类型声明的列绑定逐列转换）
// 失败策略: 单行转换失败跳过该行并记录错误，不影响其它行
// ==========================================

use crate::domain::{AssetHandle, ImportBundle, Row};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::RecordImporter;
use anyhow::anyhow;
use tracing::{debug, info, warn};

/// 具名自定义转换：(原始字符串, 构造中的记录)
pub type Conversion<'a, T> = Box<dyn Fn(&str, &mut T) -> Result<(), String> + 'a>;

// ==========================================
// ColumnSetter - 列值写入方式
// ==========================================
pub enum ColumnSetter<T> {
    /// 原样复制字符串
    Text(fn(&mut T, String)),
    Int(fn(&mut T, i32)),
    Float(fn(&mut T, f32)),
    Double(fn(&mut T, f64)),
    Bool(fn(&mut T, bool)),
    /// 单元格值为资源名，写入校验阶段挂在行上的资源句柄
    Resource(fn(&mut T, AssetHandle)),
    /// 交给导入器的具名转换；导入器未声明则字段保持默认值
    Custom(&'static str),
}

impl<T> ColumnSetter<T> {
    fn kind(&self) -> &'static str {
        match self {
            ColumnSetter::Text(_) => "text",
            ColumnSetter::Int(_) => "int",
            ColumnSetter::Float(_) => "float",
            ColumnSetter::Double(_) => "double",
            ColumnSetter::Bool(_) => "bool",
            ColumnSetter::Resource(_) => "resource",
            ColumnSetter::Custom(_) => "custom",
        }
    }
}

/// 一条列绑定：源列名 + 写入方式
pub struct ColumnBinding<T> {
    pub column: &'static str,
    pub setter: ColumnSetter<T>,
}

impl<T> ColumnBinding<T> {
    pub fn text(column: &'static str, set: fn(&mut T, String)) -> Self {
        Self { column, setter: ColumnSetter::Text(set) }
    }

    pub fn int(column: &'static str, set: fn(&mut T, i32)) -> Self {
        Self { column, setter: ColumnSetter::Int(set) }
    }

    pub fn float(column: &'static str, set: fn(&mut T, f32)) -> Self {
        Self { column, setter: ColumnSetter::Float(set) }
    }

    pub fn double(column: &'static str, set: fn(&mut T, f64)) -> Self {
        Self { column, setter: ColumnSetter::Double(set) }
    }

    pub fn bool(column: &'static str, set: fn(&mut T, bool)) -> Self {
        Self { column, setter: ColumnSetter::Bool(set) }
    }

    pub fn resource(column: &'static str, set: fn(&mut T, AssetHandle)) -> Self {
        Self { column, setter: ColumnSetter::Resource(set) }
    }

    pub fn custom(column: &'static str, method: &'static str) -> Self {
        Self { column, setter: ColumnSetter::Custom(method) }
    }
}

impl<T> std::fmt::Debug for ColumnBinding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnBinding")
            .field("column", &self.column)
            .field("setter", &self.setter.kind())
            .finish()
    }
}

// ==========================================
// TableRecord Trait
// ==========================================
// 用途: 记录类型静态声明列绑定表；每个已校验行生成一个默认值实例再逐列写入
pub trait TableRecord: Default {
    fn bindings() -> Vec<ColumnBinding<Self>>;
}

/// 映射结果
#[derive(Debug)]
pub struct MappingOutcome<T> {
    // 成功映射的记录（保持行顺序）
    pub records: Vec<T>,

    // 被跳过行的错误（均为 ImportError::FieldConversion）
    pub errors: Vec<ImportError>,
}

impl<T> MappingOutcome<T> {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

// 绑定 + 预先解析好的自定义转换
struct ActiveBinding<'a, T> {
    binding: ColumnBinding<T>,
    conversion: Option<Conversion<'a, T>>,
}

// ==========================================
// FieldMapper - 字段映射引擎
// ==========================================
pub struct FieldMapper<'i, I: RecordImporter + ?Sized> {
    importer: &'i I,
}

impl<'i, I: RecordImporter + ?Sized> FieldMapper<'i, I> {
    pub fn new(importer: &'i I) -> Self {
        Self { importer }
    }

    /// 映射数据包中已发布的校验通过行
    ///
    /// # 返回
    /// - Err: 数据包尚未通过校验（没有可映射的行）
    pub fn map_bundle(&self, bundle: &ImportBundle) -> ImportResult<MappingOutcome<I::Record>> {
        let rows = bundle
            .validated_rows()
            .ok_or_else(|| ImportError::Other(anyhow!("数据包尚未通过校验，拒绝映射")))?;

        Ok(self.map_rows(&bundle.field_names, rows))
    }

    /// 逐行映射
    ///
    /// 记录类型声明了但表中不存在的列直接忽略（可选列）
    pub fn map_rows(&self, field_names: &[String], rows: &[Row]) -> MappingOutcome<I::Record> {
        let active = self.active_bindings(field_names);

        let mut records = Vec::with_capacity(rows.len());
        let mut errors = Vec::new();

        for row in rows {
            match Self::map_row(&active, row) {
                Ok(record) => records.push(record),
                Err(e) => {
                    warn!(line = row.line_number, error = %e, "记录映射失败，跳过该行");
                    errors.push(e);
                }
            }
        }

        info!(
            rows = rows.len(),
            records = records.len(),
            errors = errors.len(),
            bindings = active.len(),
            "字段映射完成"
        );

        MappingOutcome { records, errors }
    }

    fn active_bindings(&self, field_names: &[String]) -> Vec<ActiveBinding<'i, I::Record>> {
        let position = |column: &str| field_names.iter().position(|f| f == column);

        let mut bindings: Vec<(usize, ColumnBinding<I::Record>)> = Vec::new();
        for binding in <I::Record as TableRecord>::bindings() {
            match position(binding.column) {
                Some(pos) => bindings.push((pos, binding)),
                None => debug!(column = binding.column, "表中无此列，绑定忽略"),
            }
        }
        // 按表中列顺序执行
        bindings.sort_by_key(|(pos, _)| *pos);

        bindings
            .into_iter()
            .map(|(_, binding)| {
                let conversion = match binding.setter {
                    ColumnSetter::Custom(method) => {
                        let found = self.importer.conversion(method);
                        if found.is_none() {
                            debug!(column = binding.column, method, "导入器未声明该转换，字段保持默认值");
                        }
                        found
                    }
                    _ => None,
                };
                ActiveBinding { binding, conversion }
            })
            .collect()
    }

    fn map_row(active: &[ActiveBinding<'_, I::Record>], row: &Row) -> ImportResult<I::Record> {
        let mut record = <I::Record as Default>::default();

        for ActiveBinding { binding, conversion } in active {
            let Some(field) = row.get(binding.column) else {
                continue;
            };

            let conversion_error = |message: String| ImportError::FieldConversion {
                line: row.line_number,
                column: binding.column.to_string(),
                message,
            };

            match &binding.setter {
                ColumnSetter::Text(set) => set(&mut record, field.value().to_string()),
                ColumnSetter::Int(set) => {
                    let value = field.as_int().map_err(|e| conversion_error(e.to_string()))?;
                    set(&mut record, value);
                }
                ColumnSetter::Float(set) => {
                    let value = field.as_float().map_err(|e| conversion_error(e.to_string()))?;
                    set(&mut record, value);
                }
                ColumnSetter::Double(set) => {
                    let value = field.as_double().map_err(|e| conversion_error(e.to_string()))?;
                    set(&mut record, value);
                }
                ColumnSetter::Bool(set) => {
                    let value = field.as_bool().map_err(|e| conversion_error(e.to_string()))?;
                    set(&mut record, value);
                }
                ColumnSetter::Resource(set) => match row.resource(field.value()) {
                    Some(handle) => set(&mut record, handle.clone()),
                    None => {
                        return Err(conversion_error(format!(
                            "资源 '{}' 未在校验阶段解析",
                            field.value()
                        )))
                    }
                },
                ColumnSetter::Custom(_) => {
                    if let Some(convert) = conversion {
                        convert(field.value(), &mut record).map_err(conversion_error)?;
                    }
                }
            }
        }

        Ok(record)
    }
}
