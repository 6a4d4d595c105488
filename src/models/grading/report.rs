//! AI 评估报告的固定结构
//!
//! 模型必须返回 `{"informe_evaluacion": {...}}`，字段名保持与提示词一致。

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationEnvelope {
    pub informe_evaluacion: EvaluationReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationReport {
    pub metadatos: ReportMetadata,
    pub resumen_general: GeneralSummary,
    pub evaluacion_detallada: Vec<QuestionEvaluation>,
}

/// 元数据，未声明的键原样保留
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alumno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asignatura: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tipo_examen: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralSummary {
    pub puntuacion_obtenida: f64,
    pub puntuacion_maxima: f64,
    pub comentario_general: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fortalezas: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub areas_mejora: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionEvaluation {
    pub pregunta: String,
    pub puntuacion_obtenida: f64,
    pub puntuacion_maxima: f64,
    pub comentario: String,
}
